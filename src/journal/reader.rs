//! Sequential journal reader
//!
//! Zero tolerance: any line that does not parse halts reading. There is no
//! skipping and no repair. A missing file reads as an empty journal.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::errors::{JournalError, JournalResult};
use super::record::JournalLine;

/// Line-numbered reader over a journal file.
pub struct JournalReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Number of lines consumed so far
    line_number: u64,
    buffer: String,
}

impl JournalReader {
    /// Opens a journal for reading.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn open(path: &Path) -> JournalResult<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(JournalError::OpenFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        Ok(Some(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line_number: 0,
            buffer: String::new(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(line))` for a well-formed record
    /// - `Ok(None)` at end of file
    /// - `Err(Corruption)` for a malformed or non-UTF-8 line
    pub fn read_next(&mut self) -> JournalResult<Option<JournalLine>> {
        self.buffer.clear();
        let line = self.line_number + 1;

        let read = self
            .reader
            .read_line(&mut self.buffer)
            .map_err(|e| JournalError::Corruption {
                line,
                reason: format!("unreadable line: {}", e),
            })?;

        if read == 0 {
            return Ok(None);
        }
        self.line_number = line;

        // Every acknowledged line ends in '\n'. Anything else is a torn
        // write, and appending after it would merge two records.
        let text = self
            .buffer
            .strip_suffix('\n')
            .ok_or_else(|| JournalError::Corruption {
                line,
                reason: "unterminated final line".to_string(),
            })?;
        JournalLine::parse(text, line).map(Some)
    }
}

impl Iterator for JournalReader {
    type Item = JournalResult<JournalLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_journal() {
        let dir = TempDir::new().unwrap();
        let reader = JournalReader::open(&dir.path().join("journal.log")).unwrap();
        assert!(reader.is_none());
    }

    #[test]
    fn test_reads_lines_in_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        // Timestamps deliberately out of order: file order wins.
        fs::write(&path, "200\tv.push_back\t\"A\"\n100\tv.push_back\t\"B\"\n").unwrap();

        let mut reader = JournalReader::open(&path).unwrap().unwrap();
        let first = reader.read_next().unwrap().unwrap();
        let second = reader.read_next().unwrap().unwrap();

        assert_eq!(first.payload, "\"A\"");
        assert_eq!(second.payload, "\"B\"");
        assert_eq!(reader.line_number(), 2);
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_unterminated_final_line_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        fs::write(&path, "1\td.erase\t5\n2\td.erase\t6").unwrap();

        let mut reader = JournalReader::open(&path).unwrap().unwrap();
        assert_eq!(
            reader.read_next().unwrap(),
            Some(JournalLine::new(1, "d.erase", "5"))
        );

        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, JournalError::Corruption { line: 2, ref reason } if reason == "unterminated final line"));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        fs::write(&path, "1\tv.push_back\t1\ngarbage\n3\tv.push_back\t3\n").unwrap();

        let mut reader = JournalReader::open(&path).unwrap().unwrap();
        assert!(reader.read_next().unwrap().is_some());

        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, JournalError::Corruption { line: 2, .. }));
    }

    #[test]
    fn test_blank_line_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        fs::write(&path, "1\tv.push_back\t1\n\n").unwrap();

        let results: Vec<_> = JournalReader::open(&path).unwrap().unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }

    #[test]
    fn test_invalid_utf8_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        fs::write(&path, [b'1', b'\t', 0xff, 0xfe, b'\t', b'1', b'\n']).unwrap();

        let mut reader = JournalReader::open(&path).unwrap().unwrap();
        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, JournalError::Corruption { line: 1, .. }));
    }
}
