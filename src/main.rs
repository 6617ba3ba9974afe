//! replaystore CLI entry point
//!
//! Installs logging, delegates to `cli::run`, writes failures to stderr as
//! a JSON error response and exits non-zero. Logs also go to stderr so
//! stdout carries only command output.

use std::io;

use tracing_subscriber::EnvFilter;

use replaystore::cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = cli::run() {
        if cli::write_error(&mut io::stderr(), e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
