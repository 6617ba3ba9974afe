//! CLI command implementations
//!
//! Both commands read the journal without replaying it into containers:
//! the CLI has no record types to decode payloads into. A line that would
//! halt replay for structural reasons halts these commands too.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::info;

use crate::journal::{JournalConfig, JournalLine, JournalReader, ReplayStats};

use super::args::{Command, JournalSource};
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_response};

/// Parse arguments and run the selected command against stdout.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli.command, &mut out)
}

/// Run the appropriate command based on CLI args
pub fn run_command<W: Write>(cmd: Command, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Inspect { source } => {
            let path = resolve_journal(&source)?;
            inspect(&path, out).map(|_| ())
        }
        Command::Verify { source } => {
            let path = resolve_journal(&source)?;
            verify(&path, out).map(|_| ())
        }
    }
}

/// Journal path from `--journal`, or from the config named by `--config`.
pub fn resolve_journal(source: &JournalSource) -> CliResult<PathBuf> {
    match (&source.journal, &source.config) {
        (Some(journal), _) => Ok(journal.clone()),
        (None, Some(config)) => Ok(JournalConfig::load(config)?.journal_path),
        (None, None) => Err(CliError::config_error(
            "either --journal or --config is required",
        )),
    }
}

fn open_reader(path: &Path) -> CliResult<JournalReader> {
    JournalReader::open(path)?.ok_or_else(|| {
        CliError::io_error(format!("journal {} does not exist", path.display()))
    })
}

/// RFC 3339 rendering of a journal timestamp, or `None` if out of range.
pub fn format_timestamp(timestamp_us: u64) -> Option<String> {
    let micros = i64::try_from(timestamp_us).ok()?;
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn line_json(number: u64, line: &JournalLine) -> serde_json::Value {
    json!({
        "line": number,
        "timestamp_us": line.timestamp_us,
        "time": format_timestamp(line.timestamp_us),
        "hook": line.hook,
        "payload": line.payload,
    })
}

/// Writes one JSON object per record. Returns the number of records.
pub fn inspect<W: Write>(path: &Path, out: &mut W) -> CliResult<u64> {
    let mut reader = open_reader(path)?;
    let mut records = 0;

    while let Some(line) = reader.read_next()? {
        write_json(out, &line_json(reader.line_number(), &line))?;
        records += 1;
    }

    info!(path = %path.display(), records, "journal inspected");
    Ok(records)
}

/// Parses every record and writes a summary with per-hook counts.
pub fn verify<W: Write>(path: &Path, out: &mut W) -> CliResult<ReplayStats> {
    let mut reader = open_reader(path)?;
    let mut stats = ReplayStats::default();

    while let Some(line) = reader.read_next()? {
        stats.observe(&line);
    }

    info!(
        path = %path.display(),
        records = stats.records_replayed,
        hooks = stats.per_hook.len(),
        "journal verified"
    );

    write_response(
        out,
        json!({
            "journal": path.display().to_string(),
            "records": stats.records_replayed,
            "per_hook": stats.per_hook,
            "first_time": stats.first_timestamp_us.and_then(format_timestamp),
            "last_time": stats.last_timestamp_us.and_then(format_timestamp),
        }),
    )?;

    Ok(stats)
}
