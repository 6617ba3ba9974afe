//! Policy without durability, for derived containers and tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::journal::{JournalResult, ReplayStats};

use super::{Journaled, Lifecycle, Persister, Policy};

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemory;

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryInstance;

impl InMemoryInstance {
    pub fn new() -> Self {
        Self
    }
}

impl Lifecycle for InMemoryInstance {
    fn run(&self) -> JournalResult<ReplayStats> {
        Ok(ReplayStats::default())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersister;

impl<S: Journaled> Persister<S> for NoopPersister {
    fn persist(&mut self, _mutation: &S::Mutation) -> JournalResult<()> {
        Ok(())
    }
}

impl Policy for InMemory {
    type Instance = InMemoryInstance;
    type Persister<S: Journaled> = NoopPersister;

    fn bind<S: Journaled>(
        _instance: &InMemoryInstance,
        _name: &str,
        _storage: &Rc<RefCell<S>>,
    ) -> JournalResult<NoopPersister> {
        Ok(NoopPersister)
    }
}
