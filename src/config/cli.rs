//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Aggregate UDP reports into per-bucket means (default)
    Summary,
    /// Print each parsed UDP report as JSON
    Parse,
    /// Describe per-interval TCP throughput or ping RTT samples
    Describe,
}

/// Outer grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupByArg {
    /// Target bitrate first, then payload size
    Bitrate,
    /// Payload size first, then target bitrate
    PayloadSize,
}

/// Policy for files that fail to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnErrorArg {
    Abort,
    Skip,
}

/// Log kind for describe mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTypeArg {
    Tcp,
    Ping,
}

/// iperfstat - summarize repeated iperf3 runs
#[derive(Parser, Debug)]
#[command(name = "iperfstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: summary, parse, or describe
    #[arg(long, value_enum, default_value = "summary")]
    pub mode: ExecutionMode,

    /// Report files or glob patterns (e.g. "logs/udp-*.txt")
    #[arg(value_name = "PATH")]
    pub inputs: Vec<String>,

    /// TOML configuration file; command-line options take precedence
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Summary Options ===
    /// Outer grouping key
    #[arg(short = 'g', long, value_enum)]
    pub group_by: Option<GroupByArg>,

    /// Write the summary as JSON to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Write the summary as CSV to this path
    #[arg(long)]
    pub csv_output: Option<PathBuf>,

    /// Keep per-bucket sample lists in the JSON summary
    #[arg(long)]
    pub include_samples: bool,

    /// Write JSON on a single line
    #[arg(long)]
    pub compact_json: bool,

    // === Input Options ===
    /// What to do with files that fail to parse
    #[arg(long, value_enum)]
    pub on_error: Option<OnErrorArg>,

    /// Parse files on the current thread only
    #[arg(long)]
    pub no_parallel: bool,

    // === Describe Options ===
    /// Log kind to describe
    #[arg(long, value_enum)]
    pub log_type: Option<LogTypeArg>,

    /// Number of histogram edges, evenly spaced from the smallest to the largest value
    #[arg(long)]
    pub bins: Option<usize>,

    /// Keep values within LO,HI (raw units: bits/sec or ms)
    #[arg(long, value_name = "LO,HI")]
    pub range: Option<String>,

    // === Runtime Options ===
    /// Log filter used when RUST_LOG is unset (e.g. warn, info, iperfstat=debug)
    #[arg(long, env = "IPERFSTAT_LOG")]
    pub log_level: Option<String>,

    /// Validate and print the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if matches!(self.bins, Some(n) if n < 2) {
            anyhow::bail!("bins must be at least 2");
        }

        if let Some(ref range) = self.range {
            crate::config::cli_convert::parse_range(range)?;
        }

        if self.mode == ExecutionMode::Describe
            && (self.json_output.is_some() || self.csv_output.is_some())
        {
            anyhow::bail!("--json-output and --csv-output apply to summary mode only");
        }

        Ok(())
    }
}
