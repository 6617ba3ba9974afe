//! Container error types
//!
//! `EmptyVector` is the only failure a caller is expected to handle; it is
//! reported before anything reaches the journal. Every journal error that
//! surfaces here is fatal unless its severity says otherwise.

use thiserror::Error;

use crate::journal::JournalError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot pop back from an empty vector")]
    EmptyVector,

    #[error("pop_back recorded at length {recorded}, but the vector has length {actual}")]
    LengthMismatch { recorded: usize, actual: usize },

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl StorageError {
    /// Whether the caller may continue using the container.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StorageError::EmptyVector => true,
            StorageError::LengthMismatch { .. } => false,
            StorageError::Journal(e) => !e.is_fatal(),
        }
    }
}

/// Result type for container operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vector_is_recoverable() {
        assert!(StorageError::EmptyVector.is_recoverable());
    }

    #[test]
    fn test_fatal_journal_error_is_not_recoverable() {
        let err: StorageError = JournalError::AlreadyRun.into();
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "journal instance has already been run");
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = StorageError::LengthMismatch {
            recorded: 3,
            actual: 2,
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("length 3"));
    }
}
