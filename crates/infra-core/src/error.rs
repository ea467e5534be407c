//! Error types for the infra-core building blocks.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for temp-file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors raised by [`crate::TempFilesManager`].
///
/// Each variant carries the numeric code callers historically matched on
/// (see [`FileError::code`]).
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file name is empty or names a directory: {0:?}")]
    InvalidName(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("cannot open {} for writing", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not delete {}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    /// Stable numeric code for this error.
    pub fn code(&self) -> u32 {
        match self {
            FileError::Create { .. } => 5000,
            FileError::Io { .. } => 5001,
            FileError::InvalidName(_) | FileError::NotFound(_) => 5002,
            FileError::Delete { .. } => 5003,
        }
    }
}

/// Errors raised while reading a properties document.
#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("could not read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: malformed \\uXXXX escape")]
    MalformedUnicodeEscape { line: usize },
}

/// Errors raised by color conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("not a hex color: {0:?}")]
    InvalidHex(String),

    #[error("not a hex alpha value: {0:?}")]
    InvalidAlpha(String),
}
