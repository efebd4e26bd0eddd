//! Transient on-disk copies of uploaded documents.
//!
//! A [`StagedDocument`] owns its file. It is removed by [`StagedDocument::close`]
//! once the extractor has terminated, or when the value is dropped if the
//! ingestion is cancelled first.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use pathnote_core::defaults::STAGING_FILE_PREFIX;
use pathnote_core::{staging_suffix, Error, Result, UploadedDocument};

/// An uploaded document written to the staging directory.
#[derive(Debug)]
pub struct StagedDocument {
    path: TempPath,
}

impl StagedDocument {
    /// Write `doc` to a uniquely named file under `staging_dir` (or the OS temp
    /// directory). The returned path is absolute and keeps the upload's
    /// extension so the extractor can dispatch on it.
    pub async fn stage(doc: &UploadedDocument, staging_dir: Option<&Path>) -> Result<Self> {
        let dir = match staging_dir {
            Some(dir) => absolute(dir)?,
            None => std::env::temp_dir(),
        };
        let suffix = staging_suffix(&doc.original_filename);

        let file = tempfile::Builder::new()
            .prefix(STAGING_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| {
                staging_error(e, format!("Failed to create staging file in {}", dir.display()))
            })?;
        let path = file.into_temp_path();

        tokio::fs::write(&path, &doc.bytes).await.map_err(|e| {
            staging_error(e, format!("Failed to write staging file {}", path.display()))
        })?;

        debug!(
            subsystem = "ingest",
            component = "staging",
            path = %path.display(),
            document_bytes = doc.len(),
            "Staged document"
        );

        Ok(Self { path })
    }

    /// Absolute path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file.
    pub fn close(self) -> std::io::Result<()> {
        match self.path.close() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Staging runs on local disk, so its failures are I/O errors rather than
/// record-store errors. The path is folded into the message.
fn staging_error(e: std::io::Error, context: String) -> Error {
    Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", context, e)))
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathnote_core::ErrorCategory;

    #[tokio::test]
    async fn test_stage_writes_bytes_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let doc = UploadedDocument::new(b"Tumor Size: 3.2 cm".to_vec(), "report.TXT");

        let staged = StagedDocument::stage(&doc, Some(dir.path())).await.unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.is_absolute());
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("txt"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("pathnote-"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Tumor Size: 3.2 cm");

        staged.close().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = UploadedDocument::new(b"x".to_vec(), "a.pdf");

        let staged = StagedDocument::stage(&doc, Some(dir.path())).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_close_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = UploadedDocument::new(b"x".to_vec(), "a.pdf");

        let staged = StagedDocument::stage(&doc, Some(dir.path())).await.unwrap();
        std::fs::remove_file(staged.path()).unwrap();
        assert!(staged.close().is_ok());
    }

    #[tokio::test]
    async fn test_stage_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let doc = UploadedDocument::new(b"x".to_vec(), "a.pdf");

        let err = StagedDocument::stage(&doc, Some(&missing)).await.unwrap_err();
        assert_eq!(err.kind(), "io");
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn test_same_filename_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let doc = UploadedDocument::new(b"x".to_vec(), "same.pdf");

        let a = StagedDocument::stage(&doc, Some(dir.path())).await.unwrap();
        let b = StagedDocument::stage(&doc, Some(dir.path())).await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
