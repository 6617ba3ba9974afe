//! A storage bound to its persister.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::policy::{Journaled, Persister, Policy};

use super::errors::StorageResult;

/// Owns one storage and the persister bound to it, and enforces
/// persist-then-apply for every mutation.
///
/// The storage is shared with the replay hooks registered at bind time;
/// nothing else holds it.
pub(crate) struct Bound<S: Journaled, P: Policy> {
    storage: Rc<RefCell<S>>,
    persister: P::Persister<S>,
}

impl<S: Journaled, P: Policy> Bound<S, P> {
    pub(crate) fn new(storage: S, name: &str, instance: &P::Instance) -> StorageResult<Self> {
        let storage = Rc::new(RefCell::new(storage));
        let persister = P::bind(instance, name, &storage)?;
        Ok(Self { storage, persister })
    }

    pub(crate) fn read(&self) -> Ref<'_, S> {
        self.storage.borrow()
    }

    /// Persists `mutation`; applies it only if the persister accepted it.
    pub(crate) fn commit(&mut self, mutation: S::Mutation) -> StorageResult<()> {
        self.persister.persist(&mutation)?;
        self.storage.borrow_mut().apply(mutation)
    }
}
