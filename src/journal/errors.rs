//! Journal error types
//!
//! Error codes:
//! - REPLAY_JOURNAL_OPEN_FAILED (FATAL)
//! - REPLAY_JOURNAL_APPEND_FAILED (FATAL)
//! - REPLAY_JOURNAL_SYNC_FAILED (FATAL)
//! - REPLAY_JOURNAL_CORRUPTION (FATAL)
//! - REPLAY_JOURNAL_UNKNOWN_HOOK (FATAL)
//! - REPLAY_JOURNAL_UNDECODABLE_PAYLOAD (FATAL)
//! - REPLAY_JOURNAL_REPLAY_REJECTED (FATAL)
//! - REPLAY_JOURNAL_DUPLICATE_HOOK (FATAL)
//! - REPLAY_JOURNAL_INVALID_HOOK_NAME (FATAL)
//! - REPLAY_JOURNAL_LATE_REGISTRATION (FATAL)
//! - REPLAY_JOURNAL_ALREADY_RUN (FATAL)
//! - REPLAY_JOURNAL_NOT_APPENDING (FATAL)
//! - REPLAY_JOURNAL_ENCODE_FAILED (ERROR)
//! - REPLAY_JOURNAL_CONFIG_ERROR (ERROR)
//!
//! A FATAL error means the journal and the in-memory state can no longer be
//! trusted to agree. Callers must stop, not retry.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

/// Severity of a journal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation failed; nothing was written and the journal is intact
    Error,
    /// The process must stop using this journal
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Lifecycle state of a journal instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalState {
    /// Hooks may be registered; nothing has been read
    Unopened,
    /// `run()` is dispatching historical lines
    Replaying,
    /// Replay finished; new records are appended
    Appending,
    /// Replay or an append failed; the instance is unusable
    Failed,
}

impl fmt::Display for JournalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JournalState::Unopened => "unopened",
            JournalState::Replaying => "replaying",
            JournalState::Appending => "appending",
            JournalState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to open journal {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to append to journal {}: {source}", path.display())]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to sync journal {}: {source}", path.display())]
    SyncFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("journal corruption at line {line}: {reason}")]
    Corruption { line: u64, reason: String },

    #[error("journal line {line} references unknown hook '{hook}'")]
    UnknownHook { line: u64, hook: String },

    #[error("journal line {line}: undecodable payload for hook '{hook}': {source}")]
    UndecodablePayload {
        line: u64,
        hook: String,
        #[source]
        source: CodecError,
    },

    #[error("journal line {line}: hook '{hook}' rejected replayed mutation: {reason}")]
    ReplayRejected {
        line: u64,
        hook: String,
        reason: String,
    },

    #[error("hook '{0}' is already registered")]
    DuplicateHook(String),

    #[error("container name '{0}' is already in use")]
    DuplicateContainer(String),

    #[error("invalid container name {0:?}: names must be non-empty and free of tabs and newlines")]
    InvalidHookName(String),

    #[error("hook '{0}' registered after the journal started running")]
    LateRegistration(String),

    #[error("journal instance has already been run")]
    AlreadyRun,

    #[error("journal is not open for appending (state: {0})")]
    NotAppending(JournalState),

    #[error("failed to encode mutation for hook '{hook}': {source}")]
    EncodeFailed {
        hook: String,
        #[source]
        source: CodecError,
    },

    #[error("invalid journal configuration: {0}")]
    Config(String),
}

impl JournalError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            JournalError::OpenFailed { .. } => "REPLAY_JOURNAL_OPEN_FAILED",
            JournalError::AppendFailed { .. } => "REPLAY_JOURNAL_APPEND_FAILED",
            JournalError::SyncFailed { .. } => "REPLAY_JOURNAL_SYNC_FAILED",
            JournalError::Corruption { .. } => "REPLAY_JOURNAL_CORRUPTION",
            JournalError::UnknownHook { .. } => "REPLAY_JOURNAL_UNKNOWN_HOOK",
            JournalError::UndecodablePayload { .. } => "REPLAY_JOURNAL_UNDECODABLE_PAYLOAD",
            JournalError::ReplayRejected { .. } => "REPLAY_JOURNAL_REPLAY_REJECTED",
            JournalError::DuplicateHook(_) => "REPLAY_JOURNAL_DUPLICATE_HOOK",
            JournalError::DuplicateContainer(_) => "REPLAY_JOURNAL_DUPLICATE_CONTAINER",
            JournalError::InvalidHookName(_) => "REPLAY_JOURNAL_INVALID_HOOK_NAME",
            JournalError::LateRegistration(_) => "REPLAY_JOURNAL_LATE_REGISTRATION",
            JournalError::AlreadyRun => "REPLAY_JOURNAL_ALREADY_RUN",
            JournalError::NotAppending(_) => "REPLAY_JOURNAL_NOT_APPENDING",
            JournalError::EncodeFailed { .. } => "REPLAY_JOURNAL_ENCODE_FAILED",
            JournalError::Config(_) => "REPLAY_JOURNAL_CONFIG_ERROR",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            JournalError::EncodeFailed { .. } | JournalError::Config(_) => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    /// Returns whether this error requires the caller to stop
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;
