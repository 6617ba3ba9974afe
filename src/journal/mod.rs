//! Append-only replay journal
//!
//! The journal is the only durable state. A mutation exists once its line
//! has been synced; on startup the whole file is replayed, first line to
//! last, and then reopened for appending.
//!
//! - Sync before acknowledgment
//! - Journal write precedes the in-memory mutation
//! - Sequential replay in file order
//! - Halt on any malformed line, unknown hook or undecodable payload
//!
//! The journal is never compacted or truncated.

mod config;
mod errors;
mod hooks;
mod reader;
mod record;
mod replay;
mod writer;

pub use config::{JournalConfig, SyncMode};
pub use errors::{JournalError, JournalResult, JournalState, Severity};
pub use hooks::{hook_name, validate_container_name, Hook, HookFailure, HookTable};
pub use reader::JournalReader;
pub use record::{now_us, JournalLine};
pub use replay::{JournalReplayer, ReplayStats};
pub use writer::JournalWriter;
