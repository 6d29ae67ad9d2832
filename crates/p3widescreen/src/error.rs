use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid archive signature: expected {expected:?}, found {found:?}")]
    InvalidSignature { expected: String, found: String },

    #[error("Corrupt archive: {0}")]
    ArchiveCorrupt(String),

    #[error("Can't find file \"{0}\" in archive")]
    EntryNotFound(String),

    #[error("Expected {expected} byte(s) at offset {offset:#x} but only got {actual}")]
    Truncated {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid byte pattern: {0}")]
    InvalidPattern(String),

    #[error("Expected byte {expected:#04x} at offset {offset:#x} but found {actual:#04x} instead")]
    PatternMismatch { offset: u64, expected: u8, actual: u8 },

    #[error("Expected {expected} value(s) to fill in but got {actual} instead")]
    ArgumentCountMismatch { expected: usize, actual: usize },

    #[error("Couldn't find end of line within {0} byte(s)")]
    UnknownLineEnding(usize),

    #[error("Already have a patch for {key} in section {section}")]
    DuplicateRule { section: String, key: String },

    #[error(
        "Expected {key} in section {section} to have value \"{expected}\" but it has value \"{actual}\" instead"
    )]
    ValueMismatch {
        section: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("No substitution given for ${name} in \"{template}\"")]
    MissingSubstitution { name: String, template: String },

    #[error("Failed to apply patches: {}", .0.join(", "))]
    UnappliedPatches(Vec<String>),

    #[error("No free backup name for {}", .0.display())]
    NoBackupSlot(PathBuf),

    #[error("Pre-flight check failed:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("Failed to patch {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::File { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Attach the file being worked on to an error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_file_context_is_transparent_for_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::Io(io_err).in_file("Patrician3.exe");
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("Failed to patch Patrician3.exe"));
    }

    #[test]
    fn test_unapplied_patches_lists_every_rule() {
        let err = Error::UnappliedPatches(vec!["SCREEN2/Size".into(), "SCREEN3/Size".into()]);
        assert_eq!(
            err.to_string(),
            "Failed to apply patches: SCREEN2/Size, SCREEN3/Size"
        );
    }

    #[test]
    fn test_pattern_mismatch_message() {
        let err = Error::PatternMismatch {
            offset: 0x23bf4,
            expected: 0x4c,
            actual: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "Expected byte 0x4c at offset 0x23bf4 but found 0x00 instead"
        );
    }
}
