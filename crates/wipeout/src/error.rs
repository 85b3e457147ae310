//! Error types for the wipeout crate.

use std::fmt;
use std::path::PathBuf;

use wipeout_decode::DecodeError;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading game files.
#[derive(Debug)]
pub enum Error {
    /// Reading a file failed.
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The error message.
        message: String,
    },
    /// Decoding failed outright.
    Decode(DecodeError),
    /// The requested object does not exist in the container.
    ObjectNotFound {
        /// The container that was searched.
        path: PathBuf,
        /// The requested object index.
        index: usize,
        /// How many objects the container actually holds.
        available: usize,
    },
    /// Cache operation failed.
    Cache {
        /// The operation that failed.
        operation: &'static str,
        /// The error message.
        message: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Attach a path to a decode error, promoting missing objects.
    pub(crate) fn decode_at(path: impl Into<PathBuf>, error: DecodeError) -> Self {
        match error {
            DecodeError::ObjectNotFound { index, available } => Error::ObjectNotFound {
                path: path.into(),
                index,
                available,
            },
            other => Error::Decode(other),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::ObjectNotFound {
                path,
                index,
                available,
            } => write!(
                f,
                "object {index} not found in {} ({available} available)",
                path.display()
            ),
            Error::Cache { operation, message } => {
                write!(f, "cache {operation} failed: {message}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}
