//! Sequence container
//!
//! Journal payloads:
//! - `push_back`: the encoded value
//! - `pop_back`: the length before the pop, checked again on replay

use std::cell::Ref;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, CodecResult, Record};
use crate::policy::{InMemory, Journaled, Policy};

use super::bound::Bound;
use super::errors::{StorageError, StorageResult};

const PUSH_BACK: &str = "push_back";
const POP_BACK: &str = "pop_back";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum VectorMutation<T> {
    PushBack { value: T },
    /// `len` is the length before the pop
    PopBack { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStorage<T> {
    items: Vec<T>,
}

impl<T> Default for VectorStorage<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> Journaled for VectorStorage<T> {
    type Mutation = VectorMutation<T>;

    const OPERATIONS: &'static [&'static str] = &[PUSH_BACK, POP_BACK];

    fn encode(mutation: &Self::Mutation) -> CodecResult<(&'static str, String)> {
        match mutation {
            VectorMutation::PushBack { value } => Ok((PUSH_BACK, codec::encode(value)?)),
            VectorMutation::PopBack { len } => Ok((POP_BACK, codec::encode(len)?)),
        }
    }

    fn decode(operation: &str, payload: &str) -> CodecResult<Self::Mutation> {
        match operation {
            PUSH_BACK => Ok(VectorMutation::PushBack {
                value: codec::decode(payload)?,
            }),
            POP_BACK => Ok(VectorMutation::PopBack {
                len: codec::decode(payload)?,
            }),
            other => Err(CodecError::unknown_operation(other, payload)),
        }
    }

    fn apply(&mut self, mutation: Self::Mutation) -> StorageResult<()> {
        match mutation {
            VectorMutation::PushBack { value } => self.items.push(value),
            VectorMutation::PopBack { len } => {
                if self.items.is_empty() {
                    return Err(StorageError::EmptyVector);
                }
                if len != self.items.len() {
                    return Err(StorageError::LengthMismatch {
                        recorded: len,
                        actual: self.items.len(),
                    });
                }
                self.items.pop();
            }
        }
        Ok(())
    }
}

/// Persisted `Vec<T>`.
pub struct Vector<T: Record, P: Policy = InMemory> {
    bound: Bound<VectorStorage<T>, P>,
}

impl<T: Record, P: Policy> Vector<T, P> {
    /// Creates an empty vector named `name` within `instance`.
    pub fn new(name: &str, instance: &P::Instance) -> StorageResult<Self> {
        Ok(Self {
            bound: Bound::new(VectorStorage::default(), name, instance)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bound.read().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bound.read().items.len()
    }

    /// Element at `index`, or `None` when out of range.
    pub fn at(&self, index: usize) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.bound.read(), |storage| storage.items.get(index)).ok()
    }

    /// Read access to all elements in order.
    pub fn items(&self) -> Ref<'_, [T]> {
        Ref::map(self.bound.read(), |storage| storage.items.as_slice())
    }

    pub fn push_back(&mut self, value: T) -> StorageResult<()> {
        self.bound.commit(VectorMutation::PushBack { value })
    }

    /// Removes the last element.
    ///
    /// Fails with [`StorageError::EmptyVector`] on an empty vector, without
    /// writing to the journal.
    pub fn pop_back(&mut self) -> StorageResult<()> {
        let len = self.len();
        if len == 0 {
            return Err(StorageError::EmptyVector);
        }
        self.bound.commit(VectorMutation::PopBack { len })
    }
}

impl<T: Record + Clone, P: Policy> Vector<T, P> {
    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.items().to_vec()
    }
}
