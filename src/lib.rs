//! replaystore - crash-recoverable containers over an append-only journal
//!
//! Containers ([`Vector`], [`Dictionary`], [`Matrix`]) hand every mutation
//! to a persistence policy before applying it. With
//! [`ReplayFromAndAppendToFile`] each mutation becomes one synced journal
//! line, and the whole journal is replayed into the containers on startup.
//!
//! ```no_run
//! use replaystore::{JournalInstance, ReplayFromAndAppendToFile, Vector};
//!
//! # fn main() -> Result<(), replaystore::StorageError> {
//! let instance = JournalInstance::new("data/journal.log");
//! let mut names: Vector<String, ReplayFromAndAppendToFile> = Vector::new("names", &instance)?;
//! instance.run()?;
//!
//! names.push_back("ada".to_string())?;
//! # Ok(())
//! # }
//! ```
//!
//! Containers must be constructed before `run()`; their names prefix the
//! hook names in the journal and must be unique within one instance.

pub mod cli;
pub mod codec;
pub mod containers;
pub mod journal;
pub mod policy;
pub mod transaction;

pub use codec::{Cell, CodecError, Keyed, Record};
pub use containers::{
    Dictionary, ManyToMany, Matrix, OneToOne, StorageError, StorageResult, Vector,
};
pub use journal::{JournalConfig, JournalError, JournalResult, JournalState, ReplayStats};
pub use policy::{
    InMemory, InMemoryInstance, JournalInstance, Journaled, Lifecycle, Policy,
    ReplayFromAndAppendToFile,
};
pub use transaction::{Transaction, TransactionError, TransactionMeta};
