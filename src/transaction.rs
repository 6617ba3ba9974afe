//! Transaction batch records
//!
//! A `Transaction` frames a window of container mutations between two
//! wall-clock timestamps. It is a data boundary for whatever groups and
//! ships mutations; nothing in this crate writes it to the journal.
//!
//! Invariants:
//! - `end_us >= begin_us` whenever both are set (0 means unset)
//! - mutations keep their application order

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction ends at {end_us}us, before it begins at {begin_us}us")]
    EndBeforeBegin { begin_us: u64, end_us: u64 },

    #[error("transaction end is set but its begin is not")]
    EndWithoutBegin,

    #[error("transaction already finished at {0}us")]
    AlreadyFinished(u64),
}

/// Wire shape of [`TransactionMeta`], validated on the way in.
#[derive(Deserialize)]
struct RawTransactionMeta {
    #[serde(default)]
    begin_us: u64,
    #[serde(default)]
    end_us: u64,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransactionMeta")]
pub struct TransactionMeta {
    begin_us: u64,
    end_us: u64,
    fields: BTreeMap<String, String>,
}

impl TryFrom<RawTransactionMeta> for TransactionMeta {
    type Error = TransactionError;

    fn try_from(raw: RawTransactionMeta) -> Result<Self, Self::Error> {
        let mut meta = TransactionMeta::new(raw.begin_us, raw.end_us)?;
        meta.fields = raw.fields;
        Ok(meta)
    }
}

fn check_bounds(begin_us: u64, end_us: u64) -> Result<(), TransactionError> {
    if end_us == 0 {
        return Ok(());
    }
    if begin_us == 0 {
        return Err(TransactionError::EndWithoutBegin);
    }
    if end_us < begin_us {
        return Err(TransactionError::EndBeforeBegin { begin_us, end_us });
    }
    Ok(())
}

impl TransactionMeta {
    pub fn new(begin_us: u64, end_us: u64) -> Result<Self, TransactionError> {
        check_bounds(begin_us, end_us)?;
        Ok(Self {
            begin_us,
            end_us,
            fields: BTreeMap::new(),
        })
    }

    /// Open transaction beginning at `begin_us`.
    pub fn started_at(begin_us: u64) -> Self {
        Self {
            begin_us,
            end_us: 0,
            fields: BTreeMap::new(),
        }
    }

    pub fn begin_us(&self) -> u64 {
        self.begin_us
    }

    pub fn end_us(&self) -> u64 {
        self.end_us
    }

    pub fn is_finished(&self) -> bool {
        self.end_us != 0
    }

    /// Sets the end timestamp. Only allowed once.
    pub fn finish(&mut self, end_us: u64) -> Result<(), TransactionError> {
        if self.is_finished() {
            return Err(TransactionError::AlreadyFinished(self.end_us));
        }
        check_bounds(self.begin_us, end_us)?;
        self.end_us = end_us;
        Ok(())
    }

    /// Sets annotation `key`, returning the value it replaced.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn is_valid(&self) -> bool {
        check_bounds(self.begin_us, self.end_us).is_ok()
    }

    /// Elapsed time, once finished.
    pub fn duration_us(&self) -> Option<u64> {
        self.is_finished()
            .then(|| self.end_us.saturating_sub(self.begin_us))
    }
}

/// Ordered batch of mutations with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction<T> {
    pub meta: TransactionMeta,
    mutations: Vec<T>,
}

impl<T> Transaction<T> {
    pub fn new(meta: TransactionMeta) -> Self {
        Self {
            meta,
            mutations: Vec::new(),
        }
    }

    /// Appends a mutation after all previously recorded ones.
    pub fn record(&mut self, mutation: T) {
        self.mutations.push(mutation);
    }

    pub fn mutations(&self) -> &[T] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn into_parts(self) -> (TransactionMeta, Vec<T>) {
        (self.meta, self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::VectorMutation;

    #[test]
    fn test_end_before_begin_is_rejected() {
        let err = TransactionMeta::new(1000, 500).unwrap_err();
        assert_eq!(
            err,
            TransactionError::EndBeforeBegin {
                begin_us: 1000,
                end_us: 500
            }
        );
    }

    #[test]
    fn test_unset_end_is_valid() {
        let meta = TransactionMeta::new(1000, 0).unwrap();
        assert!(meta.is_valid());
        assert!(!meta.is_finished());
        assert_eq!(meta.duration_us(), None);
    }

    #[test]
    fn test_end_without_begin_is_rejected() {
        assert_eq!(
            TransactionMeta::new(0, 10).unwrap_err(),
            TransactionError::EndWithoutBegin
        );
    }

    #[test]
    fn test_finish_once() {
        let mut meta = TransactionMeta::started_at(1000);
        assert!(meta.finish(900).is_err());
        assert!(!meta.is_finished());

        meta.finish(1500).unwrap();
        assert_eq!(meta.duration_us(), Some(500));
        assert_eq!(
            meta.finish(2000).unwrap_err(),
            TransactionError::AlreadyFinished(1500)
        );
    }

    #[test]
    fn test_annotations_have_unique_keys() {
        let mut meta = TransactionMeta::started_at(1);
        assert_eq!(meta.annotate("source", "import"), None);
        assert_eq!(meta.annotate("source", "sync"), Some("import".to_string()));

        assert_eq!(meta.fields().len(), 1);
        assert_eq!(meta.field("source"), Some("sync"));
    }

    #[test]
    fn test_deserialize_validates_bounds() {
        let ok: TransactionMeta =
            serde_json::from_str(r#"{"begin_us":1000,"end_us":2000,"fields":{"a":"b"}}"#)
                .unwrap();
        assert_eq!(ok.field("a"), Some("b"));

        let bad = serde_json::from_str::<TransactionMeta>(r#"{"begin_us":1000,"end_us":500}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_mutation_order_is_preserved() {
        let mut tx = Transaction::new(TransactionMeta::started_at(10));
        tx.record(VectorMutation::PushBack { value: 1u32 });
        tx.record(VectorMutation::PushBack { value: 2 });
        tx.record(VectorMutation::PopBack { len: 2 });

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction<VectorMutation<u32>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);

        let (meta, mutations) = back.into_parts();
        assert_eq!(meta.begin_us(), 10);
        assert_eq!(
            mutations,
            vec![
                VectorMutation::PushBack { value: 1 },
                VectorMutation::PushBack { value: 2 },
                VectorMutation::PopBack { len: 2 },
            ]
        );
    }
}
