//! Child-process implementation of [`ExtractionProcess`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use pathnote_core::defaults::EXTRACTOR_HEALTH_TIMEOUT_SECS;
use pathnote_core::{Error, ExtractionOutput, ExtractionProcess, Result};

use crate::config::ExtractorConfig;

/// Runs `program [args..] <document>` as a child process.
///
/// Stdin is closed. Stdout and stderr are captured in full and drained while
/// the child runs, so a chatty extractor cannot block on a full pipe. The
/// child is killed if the returned future is dropped before it exits.
#[derive(Debug, Clone)]
pub struct CommandProcess {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    health_timeout: Duration,
}

impl CommandProcess {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            health_timeout: Duration::from_secs(EXTRACTOR_HEALTH_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        let mut process = Self::new(config.program.clone(), config.args.clone());
        process.working_dir = config.working_dir.clone();
        process
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Bound on [`health_check`](ExtractionProcess::health_check).
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// The script named by the first prefix argument, if it names one.
    ///
    /// Flags such as `-c` are not scripts. A bare word counts only when it
    /// has a directory component or an extension. Relative paths resolve
    /// against the working directory.
    fn script_path(&self) -> Option<PathBuf> {
        let first = self.args.first()?;
        if first.starts_with('-') {
            return None;
        }
        let path = Path::new(first);
        let looks_like_path = path.extension().is_some() || path.components().count() > 1;
        if !looks_like_path {
            return None;
        }
        match &self.working_dir {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path.to_path_buf()),
        }
    }
}

#[async_trait]
impl ExtractionProcess for CommandProcess {
    async fn run(&self, document: &Path) -> Result<ExtractionOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(document)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| Error::ExtractionLaunch {
            program: self.program.clone(),
            source,
        })?;
        debug!(
            subsystem = "ingest",
            component = "process",
            program = %self.program,
            pid = child.id(),
            "Extractor started"
        );

        let output = child.wait_with_output().await?;

        Ok(ExtractionOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_status: output.status.code(),
        })
    }

    fn program(&self) -> &str {
        &self.program
    }

    /// Check that the extractor can be launched.
    ///
    /// The script named by the first prefix argument must exist, and
    /// `program --version` must exit within the health timeout. Any exit
    /// status counts as launchable. A child still running at the bound is
    /// killed and reported unhealthy.
    async fn health_check(&self) -> Result<bool> {
        if let Some(script) = self.script_path() {
            if tokio::fs::metadata(&script).await.is_err() {
                warn!(
                    subsystem = "ingest",
                    component = "process",
                    script = %script.display(),
                    "Extractor script not found"
                );
                return Ok(false);
            }
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        match tokio::time::timeout(self.health_timeout, cmd.status()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(_)) => Ok(false),
            Err(_) => {
                warn!(
                    subsystem = "ingest",
                    component = "process",
                    program = %self.program,
                    timeout_ms = self.health_timeout.as_millis() as u64,
                    "Extractor health check timed out"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn sh(script: &str) -> CommandProcess {
        CommandProcess::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_document_path_is_last_argument() {
        let output = sh("printf '%s' \"$0\"")
            .run(Path::new("/tmp/pathnote-doc.pdf"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "/tmp/pathnote-doc.pdf");
        assert_eq!(output.exit_status, Some(0));
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let output = sh("echo out; echo err >&2")
            .run(Path::new("/dev/null"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported_not_raised() {
        let output = sh("echo 'corrupt file' >&2; exit 3")
            .run(Path::new("/dev/null"))
            .await
            .unwrap();
        assert_eq!(output.exit_status, Some(3));
        assert!(!output.succeeded());
        assert_eq!(output.stderr.trim(), "corrupt file");
    }

    #[tokio::test]
    async fn test_large_output_does_not_deadlock() {
        // Well past a pipe buffer on both streams.
        let output = sh("head -c 300000 /dev/zero | tr '\\0' a; head -c 300000 /dev/zero | tr '\\0' b >&2")
            .run(Path::new("/dev/null"))
            .await
            .unwrap();
        assert_eq!(output.stdout.len(), 300000);
        assert_eq!(output.stderr.len(), 300000);
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let output = sh("cat; echo done").run(Path::new("/dev/null")).await.unwrap();
        assert_eq!(output.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let err = CommandProcess::new("/nonexistent/pathnote-extractor", vec![])
            .run(Path::new("/dev/null"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "extraction_launch");
        assert!(err.to_string().contains("/nonexistent/pathnote-extractor"));
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let output = sh("pwd")
            .with_working_dir(dir.path())
            .run(Path::new("/dev/null"))
            .await
            .unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(sh("true").health_check().await.unwrap());
        assert!(!CommandProcess::new("/nonexistent/pathnote-extractor", vec![])
            .health_check()
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_health_check_is_bounded_for_unresponsive_extractor() {
        let dir = tempfile::tempdir().unwrap();
        // Treats `--version` as a document and never answers.
        let script = dir.path().join("slow_extractor.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let process = CommandProcess::new(script.display().to_string(), vec![])
            .with_health_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let healthy = tokio::time::timeout(Duration::from_secs(5), process.health_check())
            .await
            .expect("health check outlived its bound")
            .unwrap();

        assert!(!healthy);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_health_check_reports_missing_script() {
        let process = CommandProcess::new("sh", vec!["/nonexistent/ehr_processor.py".to_string()]);
        assert!(!process.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_check_resolves_script_against_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("services")).unwrap();
        std::fs::write(dir.path().join("services/ehr_processor.sh"), "exit 0\n").unwrap();

        let present = CommandProcess::new("sh", vec!["services/ehr_processor.sh".to_string()])
            .with_working_dir(dir.path());
        assert!(present.health_check().await.unwrap());

        let absent = CommandProcess::new("sh", vec!["services/missing.sh".to_string()])
            .with_working_dir(dir.path());
        assert!(!absent.health_check().await.unwrap());
    }

    #[test]
    fn test_flags_and_bare_words_are_not_scripts() {
        assert_eq!(sh("true").script_path(), None);
        assert_eq!(CommandProcess::new("node", vec!["index".into()]).script_path(), None);
        assert_eq!(
            CommandProcess::new("python3", vec!["services/ehr_processor.py".into()]).script_path(),
            Some(PathBuf::from("services/ehr_processor.py"))
        );
    }
}
