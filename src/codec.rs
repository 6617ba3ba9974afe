//! Record codec and capability extractors
//!
//! Every stored value crosses the journal as compact JSON. Compact JSON
//! escapes control characters inside strings, so an encoded value never
//! contains a raw tab or newline and always fits in one journal field.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Failure to turn a value into journal text or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode value from {text:?}: {source}")]
    Decode {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed payload {text:?}: {reason}")]
    Malformed { text: String, reason: String },
}

impl CodecError {
    pub fn malformed(text: &str, reason: impl Into<String>) -> Self {
        CodecError::Malformed {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unknown_operation(operation: &str, payload: &str) -> Self {
        Self::malformed(payload, format!("unknown operation '{}'", operation))
    }
}

/// Anything that can be stored in a container.
pub trait Record: Serialize + DeserializeOwned + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + 'static {}

/// Types usable as a dictionary key or a matrix axis.
pub trait IndexKey: Record + Ord + Clone {}

impl<T> IndexKey for T where T: Record + Ord + Clone {}

/// Records stored in a [`Dictionary`](crate::containers::Dictionary).
pub trait Keyed: Record {
    type Key: IndexKey;

    fn key(&self) -> Self::Key;
}

/// Records stored in a [`Matrix`](crate::containers::Matrix).
pub trait Cell: Record {
    type Row: IndexKey;
    type Col: IndexKey;

    fn row(&self) -> Self::Row;
    fn col(&self) -> Self::Col;
}

/// Serializes a value into a single-line journal field.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(CodecError::Encode)
}

/// Parses a journal field back into a value.
pub fn decode<T: DeserializeOwned>(text: &str) -> CodecResult<T> {
    serde_json::from_str(text).map_err(|source| CodecError::Decode {
        text: text.to_string(),
        source,
    })
}
