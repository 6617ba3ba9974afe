//! Ordered map container
//!
//! Records are indexed by [`Keyed::key`]. Insert overwrites; erase is
//! journaled even when the key is absent.

use std::cell::Ref;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, CodecResult, Keyed};
use crate::policy::{InMemory, Journaled, Policy};

use super::bound::Bound;
use super::errors::StorageResult;

const INSERT: &str = "insert";
const ERASE: &str = "erase";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", bound = "T: Keyed")]
pub enum DictionaryMutation<T: Keyed> {
    Insert { record: T },
    Erase { key: T::Key },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryStorage<T: Keyed> {
    map: BTreeMap<T::Key, T>,
}

impl<T: Keyed> Default for DictionaryStorage<T> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<T: Keyed> Journaled for DictionaryStorage<T> {
    type Mutation = DictionaryMutation<T>;

    const OPERATIONS: &'static [&'static str] = &[INSERT, ERASE];

    fn encode(mutation: &Self::Mutation) -> CodecResult<(&'static str, String)> {
        match mutation {
            DictionaryMutation::Insert { record } => Ok((INSERT, codec::encode(record)?)),
            DictionaryMutation::Erase { key } => Ok((ERASE, codec::encode(key)?)),
        }
    }

    fn decode(operation: &str, payload: &str) -> CodecResult<Self::Mutation> {
        match operation {
            INSERT => Ok(DictionaryMutation::Insert {
                record: codec::decode(payload)?,
            }),
            ERASE => Ok(DictionaryMutation::Erase {
                key: codec::decode(payload)?,
            }),
            other => Err(CodecError::unknown_operation(other, payload)),
        }
    }

    fn apply(&mut self, mutation: Self::Mutation) -> StorageResult<()> {
        match mutation {
            DictionaryMutation::Insert { record } => {
                self.map.insert(record.key(), record);
            }
            DictionaryMutation::Erase { key } => {
                self.map.remove(&key);
            }
        }
        Ok(())
    }
}

/// Persisted `BTreeMap<T::Key, T>`.
pub struct Dictionary<T: Keyed, P: Policy = InMemory> {
    bound: Bound<DictionaryStorage<T>, P>,
}

impl<T: Keyed, P: Policy> Dictionary<T, P> {
    pub fn new(name: &str, instance: &P::Instance) -> StorageResult<Self> {
        Ok(Self {
            bound: Bound::new(DictionaryStorage::default(), name, instance)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bound.read().map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bound.read().map.len()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.bound.read().map.contains_key(key)
    }

    pub fn get(&self, key: &T::Key) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.bound.read(), |storage| storage.map.get(key)).ok()
    }

    /// Read access to all records in ascending key order.
    ///
    /// Bounded traversal goes through `BTreeMap::range` on the returned map.
    /// The guard must be dropped before the next mutation.
    pub fn entries(&self) -> Ref<'_, BTreeMap<T::Key, T>> {
        Ref::map(self.bound.read(), |storage| &storage.map)
    }

    /// Record with the smallest key.
    pub fn first(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.bound.read(), |storage| {
            storage.map.first_key_value().map(|(_, record)| record)
        })
        .ok()
    }

    /// Record with the largest key.
    pub fn last(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.bound.read(), |storage| {
            storage.map.last_key_value().map(|(_, record)| record)
        })
        .ok()
    }

    /// Inserts `record` under its key, replacing any previous record.
    pub fn insert(&mut self, record: T) -> StorageResult<()> {
        self.bound.commit(DictionaryMutation::Insert { record })
    }

    /// Removes `key`. The erase is journaled whether or not the key exists.
    pub fn erase(&mut self, key: T::Key) -> StorageResult<()> {
        self.bound.commit(DictionaryMutation::Erase { key })
    }
}

/// One-to-one relation: a dictionary keyed by the record's key.
pub type OneToOne<T, P = InMemory> = Dictionary<T, P>;
