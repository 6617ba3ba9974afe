//! Persistence policies
//!
//! A policy decides what happens to a container mutation before it is
//! applied in memory. It supplies:
//!
//! - an `Instance` with a one-shot startup [`Lifecycle::run`], and
//! - a [`Persister`] for every [`Journaled`] storage kind.
//!
//! Containers call `persist` first and mutate only if it succeeded.
//! Persisters never touch storage themselves, except through the replay
//! hooks they register at bind time.

mod durable;
mod in_memory;

use std::cell::RefCell;
use std::rc::Rc;

use crate::codec::CodecResult;
use crate::containers::StorageResult;
use crate::journal::{JournalResult, ReplayStats};

pub use durable::{JournalInstance, JournalPersister, ReplayFromAndAppendToFile};
pub use in_memory::{InMemory, InMemoryInstance, NoopPersister};

/// In-memory representation of one container kind.
///
/// `apply` is the only way a storage changes, for live calls and for replay
/// alike, so replaying a line repeats exactly what the live call did.
pub trait Journaled: 'static {
    type Mutation;

    /// Operation names, one replay hook each
    const OPERATIONS: &'static [&'static str];

    /// Returns the operation name and the payload field for a mutation.
    fn encode(mutation: &Self::Mutation) -> CodecResult<(&'static str, String)>;

    /// Rebuilds a mutation from a journal payload.
    fn decode(operation: &str, payload: &str) -> CodecResult<Self::Mutation>;

    fn apply(&mut self, mutation: Self::Mutation) -> StorageResult<()>;
}

/// Records a mutation before it is applied.
pub trait Persister<S: Journaled> {
    fn persist(&mut self, mutation: &S::Mutation) -> JournalResult<()>;
}

/// Startup lifecycle of a policy instance.
pub trait Lifecycle {
    /// Performs startup recovery. Callable once.
    fn run(&self) -> JournalResult<ReplayStats>;
}

pub trait Policy {
    type Instance: Lifecycle;
    type Persister<S: Journaled>: Persister<S>;

    /// Creates the persister for a container named `name` and registers
    /// whatever replay hooks the policy needs.
    fn bind<S: Journaled>(
        instance: &Self::Instance,
        name: &str,
        storage: &Rc<RefCell<S>>,
    ) -> JournalResult<Self::Persister<S>>;
}
