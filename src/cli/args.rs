//! CLI argument definitions using clap
//!
//! Commands:
//! - replaystore inspect (--journal <path> | --config <path>)
//! - replaystore verify (--journal <path> | --config <path>)

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// replaystore - inspect and verify replay journals
#[derive(Parser, Debug)]
#[command(name = "replaystore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where to find the journal: directly, or through a config file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct JournalSource {
    /// Path to the journal file
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Path to a JSON configuration file naming the journal
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every record of a journal
    Inspect {
        #[command(flatten)]
        source: JournalSource,
    },

    /// Parse the whole journal and report per-hook record counts
    Verify {
        #[command(flatten)]
        source: JournalSource,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
