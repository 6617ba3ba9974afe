//! Command-line interface
//!
//! - inspect: print every journal record as JSON
//! - verify: parse the whole journal and summarise it

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, JournalSource};
pub use commands::{format_timestamp, inspect, resolve_journal, run, run_command, verify};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_json, write_response};
