//! Error types for core store operations

use std::fmt;
use std::io;

/// Result type for core store operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for core store operations
#[derive(Debug)]
pub enum CoreError {
    /// I/O error from the persistence layer
    Io(io::Error),
    /// Serialization/deserialization error from a persisted blob
    Json(serde_json::Error),
    /// Node or path not found
    NotFound(String),
    /// Target exists but is not a directory
    NotADirectory(String),
    /// Target exists but is not a file
    NotAFile(String),
    /// Parent id is missing or not a directory
    InvalidParent(String),
    /// Invalid argument (bad name, bad path, ...)
    InvalidArgument(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Io(e) => write!(f, "I/O error: {}", e),
            CoreError::Json(e) => write!(f, "JSON error: {}", e),
            CoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CoreError::NotADirectory(msg) => write!(f, "Not a directory: {}", msg),
            CoreError::NotAFile(msg) => write!(f, "Not a file: {}", msg),
            CoreError::InvalidParent(msg) => write!(f, "Invalid parent: {}", msg),
            CoreError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Io(e) => Some(e),
            CoreError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => CoreError::NotFound(e.to_string()),
            _ => CoreError::Io(e),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Json(e)
    }
}
