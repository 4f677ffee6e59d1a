//! # Engine Error Types Module
//!
//! This module defines the error type shared by the directory-facing parts of
//! the engine. Parsing and conversion have no error channel; only loading the
//! ingredient or unit directories can fail.

use thiserror::Error;

/// Errors raised while talking to the backing directories
#[derive(Debug, Error)]
pub enum EngineError {
    /// The canonical ingredient directory could not be queried
    #[error("Ingredient directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The measurement unit directory could not be loaded
    #[error("Unit directory unavailable: {0}")]
    UnitDirectoryUnavailable(String),

    /// A directory call exceeded its time budget
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A directory row or fixture could not be interpreted
    #[error("Invalid directory data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this is the matcher's "directory could not be loaded" failure
    pub fn is_directory_unavailable(&self) -> bool {
        matches!(self, EngineError::DirectoryUnavailable(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::DirectoryUnavailable(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::DirectoryUnavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Ingredient directory unavailable: connection refused"
        );
        assert!(err.is_directory_unavailable());

        let err = EngineError::Timeout("unit load".to_string());
        assert!(!err.is_directory_unavailable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: EngineError = serde_json::from_str::<Vec<u8>>("not json").unwrap_err().into();
        assert!(matches!(err, EngineError::Json(_)));
    }
}
