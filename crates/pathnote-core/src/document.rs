//! Upload validation and staging-name helpers.
//!
//! Documents are handed to an external program, so compiled executables are
//! refused by magic bytes before they ever reach the staging directory.

use crate::error::{Error, Result};
use crate::models::UploadedDocument;

/// Magic byte signatures for executable files. Windows images are checked
/// separately by [`is_pe_image`], since `MZ` alone is ordinary text.
const EXECUTABLE_SIGNATURES: &[(&str, &[u8])] = &[
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("Mach-O Fat / Java Class", &[0xCA, 0xFE, 0xBA, 0xBE]),
];

/// DOS header field holding the offset of the PE signature.
const PE_OFFSET_FIELD: usize = 0x3C;

/// Size of the DOS header that precedes every PE image.
const DOS_HEADER_LEN: usize = 0x40;

/// Longest extension carried over to the staged file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Check an upload before it is staged.
///
/// Rejects empty content, a blank filename, content larger than
/// `max_bytes`, and compiled executables.
pub fn validate_document(doc: &UploadedDocument, max_bytes: usize) -> Result<()> {
    if doc.is_empty() {
        return Err(Error::InvalidInput("No file uploaded".to_string()));
    }
    if doc.original_filename.trim().is_empty() {
        return Err(Error::InvalidInput("Document filename is blank".to_string()));
    }
    if doc.len() > max_bytes {
        return Err(Error::InvalidInput(format!(
            "Document exceeds maximum size of {} bytes",
            max_bytes
        )));
    }
    let executable = EXECUTABLE_SIGNATURES
        .iter()
        .find(|(_, magic)| doc.bytes.starts_with(magic))
        .map(|(name, _)| *name)
        .or_else(|| is_pe_image(&doc.bytes).then_some("Windows PE"));
    if let Some(name) = executable {
        return Err(Error::InvalidInput(format!(
            "Executable content is not accepted: {}",
            name
        )));
    }
    Ok(())
}

/// Whether `bytes` is a Windows PE image: an `MZ` DOS header whose
/// `e_lfanew` field points at a `PE\0\0` signature inside the file.
fn is_pe_image(bytes: &[u8]) -> bool {
    if bytes.len() < DOS_HEADER_LEN || !bytes.starts_with(b"MZ") {
        return false;
    }
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[PE_OFFSET_FIELD..PE_OFFSET_FIELD + 4]);
    let Ok(offset) = usize::try_from(u32::from_le_bytes(field)) else {
        return false;
    };
    offset
        .checked_add(4)
        .and_then(|end| bytes.get(offset..end))
        .is_some_and(|signature| signature == b"PE\0\0")
}

/// Suffix for the staged copy of `filename`: its extension with the leading
/// dot, or an empty string.
///
/// Path components are stripped and only ASCII alphanumerics are kept, so the
/// result is always safe to pass to the extractor as part of a path.
pub fn staging_suffix(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => return String::new(),
    };
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_lowercase();
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    }
}
