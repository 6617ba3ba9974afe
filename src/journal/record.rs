//! Journal wire record
//!
//! One record per line, three tab-separated fields:
//!
//! ```text
//! <timestamp_us>\t<hook>\t<payload>\n
//! ```
//!
//! The timestamp is informational. File order is the replay order.
//! Only the first two tabs are structural; the payload may contain more.

use chrono::Utc;

use super::errors::{JournalError, JournalResult};

/// A single parsed journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLine {
    /// Wall-clock microseconds at append time
    pub timestamp_us: u64,
    /// `<container-name>.<operation>`
    pub hook: String,
    /// Codec output, opaque to the journal
    pub payload: String,
}

impl JournalLine {
    pub fn new(timestamp_us: u64, hook: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            timestamp_us,
            hook: hook.into(),
            payload: payload.into(),
        }
    }

    /// Parses one line, without its trailing newline.
    ///
    /// `line` is the 1-based line number used in error reports.
    pub fn parse(text: &str, line: u64) -> JournalResult<Self> {
        let corruption = |reason: &str| JournalError::Corruption {
            line,
            reason: reason.to_string(),
        };

        let mut fields = text.splitn(3, '\t');

        let timestamp = fields.next().unwrap_or_default();
        let hook = fields
            .next()
            .ok_or_else(|| corruption("missing tab between timestamp and hook name"))?;
        let payload = fields
            .next()
            .ok_or_else(|| corruption("missing tab between hook name and payload"))?;

        let timestamp_us = timestamp.parse::<u64>().map_err(|_| JournalError::Corruption {
            line,
            reason: format!("timestamp {:?} is not an unsigned integer", timestamp),
        })?;

        if hook.is_empty() {
            return Err(corruption("empty hook name"));
        }

        Ok(Self::new(timestamp_us, hook, payload))
    }

    /// Renders the line including its trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\n", self.timestamp_us, self.hook, self.payload)
    }
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_us() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}
