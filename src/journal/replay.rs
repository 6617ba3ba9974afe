//! Journal replay
//!
//! Reads the journal from its first line to its last and dispatches each
//! line through the hook table. The first failure aborts replay; nothing
//! after it is applied.

use std::collections::BTreeMap;

use super::errors::JournalResult;
use super::hooks::HookTable;
use super::reader::JournalReader;
use super::record::JournalLine;

/// Statistics from a completed replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of lines dispatched
    pub records_replayed: u64,
    /// Lines dispatched per hook name
    pub per_hook: BTreeMap<String, u64>,
    /// Timestamp of the first line, if any
    pub first_timestamp_us: Option<u64>,
    /// Timestamp of the last line, if any
    pub last_timestamp_us: Option<u64>,
}

impl ReplayStats {
    pub fn is_empty(&self) -> bool {
        self.records_replayed == 0
    }

    /// Lines dispatched to `hook`
    pub fn count(&self, hook: &str) -> u64 {
        self.per_hook.get(hook).copied().unwrap_or(0)
    }

    /// Counts `line` as replayed.
    pub fn observe(&mut self, line: &JournalLine) {
        self.records_replayed += 1;
        *self.per_hook.entry(line.hook.clone()).or_insert(0) += 1;
        self.first_timestamp_us.get_or_insert(line.timestamp_us);
        self.last_timestamp_us = Some(line.timestamp_us);
    }
}

pub struct JournalReplayer;

impl JournalReplayer {
    /// Replays every line of `reader` into `hooks`.
    pub fn replay(reader: &mut JournalReader, hooks: &mut HookTable) -> JournalResult<ReplayStats> {
        let mut stats = ReplayStats::default();

        while let Some(line) = reader.read_next()? {
            hooks.dispatch(&line, reader.line_number())?;
            stats.observe(&line);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::errors::JournalError;
    use crate::journal::hooks::{Hook, HookFailure};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn counting_table(applied: &Rc<RefCell<Vec<String>>>) -> HookTable {
        let mut table = HookTable::new();
        let mut hooks: Vec<(String, Hook)> = Vec::new();
        for name in ["v.push_back", "v.pop_back"] {
            let applied = Rc::clone(applied);
            hooks.push((
                name.to_string(),
                Box::new(move |payload: &str| {
                    if payload == "bad" {
                        return Err(HookFailure::Rejected("bad payload".to_string()));
                    }
                    applied.borrow_mut().push(payload.to_string());
                    Ok(())
                }),
            ));
        }
        table.register_all(hooks).unwrap();
        table
    }

    fn reader_for(dir: &TempDir, content: &str) -> JournalReader {
        let path = dir.path().join("journal.log");
        fs::write(&path, content).unwrap();
        JournalReader::open(&path).unwrap().unwrap()
    }

    #[test]
    fn test_full_replay() {
        let dir = TempDir::new().unwrap();
        let applied = Rc::new(RefCell::new(Vec::new()));
        let mut table = counting_table(&applied);
        let mut reader = reader_for(
            &dir,
            "100\tv.push_back\t\"A\"\n200\tv.push_back\t\"B\"\n300\tv.pop_back\t2\n",
        );

        let stats = JournalReplayer::replay(&mut reader, &mut table).unwrap();

        assert_eq!(stats.records_replayed, 3);
        assert_eq!(stats.count("v.push_back"), 2);
        assert_eq!(stats.count("v.pop_back"), 1);
        assert_eq!(stats.first_timestamp_us, Some(100));
        assert_eq!(stats.last_timestamp_us, Some(300));
        assert_eq!(applied.borrow().len(), 3);
    }

    #[test]
    fn test_rejection_aborts_replay() {
        let dir = TempDir::new().unwrap();
        let applied = Rc::new(RefCell::new(Vec::new()));
        let mut table = counting_table(&applied);
        let mut reader = reader_for(
            &dir,
            "1\tv.push_back\t\"A\"\n2\tv.push_back\tbad\n3\tv.push_back\t\"C\"\n",
        );

        let err = JournalReplayer::replay(&mut reader, &mut table).unwrap_err();

        assert!(matches!(err, JournalError::ReplayRejected { line: 2, .. }));
        assert_eq!(*applied.borrow(), vec!["\"A\"".to_string()]);
    }

    #[test]
    fn test_empty_journal_replay() {
        let dir = TempDir::new().unwrap();
        let applied = Rc::new(RefCell::new(Vec::new()));
        let mut table = counting_table(&applied);
        let mut reader = reader_for(&dir, "");

        let stats = JournalReplayer::replay(&mut reader, &mut table).unwrap();
        assert!(stats.is_empty());
        assert_eq!(stats.first_timestamp_us, None);
    }
}
