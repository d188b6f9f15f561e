//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::stats::GroupBy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// What to do when one input file cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first bad file
    #[default]
    Abort,
    /// Log a warning and continue with the remaining files
    Skip,
}

/// Kind of per-interval log handled by the describe mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// iperf3 TCP client log, one throughput sample per interval
    #[default]
    Tcp,
    /// ping output, one round-trip time per reply
    Ping,
}

impl LogType {
    /// Heading for the description block
    pub fn label(self) -> &'static str {
        match self {
            LogType::Tcp => "Throughput (Mbps)",
            LogType::Ping => "RTT (ms)",
        }
    }

    /// Divisor applied to raw values for display
    pub fn scale(self) -> f64 {
        match self {
            LogType::Tcp => 1e6,
            LogType::Ping => 1.0,
        }
    }
}

/// Input files and loading policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Files or glob patterns
    #[serde(default)]
    pub paths: Vec<String>,
    /// Parse files on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub on_error: OnError,
}

fn default_parallel() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            parallel: default_parallel(),
            on_error: OnError::default(),
        }
    }
}

/// Grouping and describe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    pub log_type: LogType,
    /// Number of histogram edges in describe mode (one fewer bins)
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Keep only values within `[lo, hi]` (raw units) before describing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

fn default_bins() -> usize {
    11
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            log_type: LogType::default(),
            bins: default_bins(),
            range: None,
        }
    }
}

/// Output destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON summary file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_output: Option<PathBuf>,
    /// CSV summary file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_output: Option<PathBuf>,
    /// Keep per-bucket sample lists in the JSON summary
    #[serde(default)]
    pub include_samples: bool,
    /// Indent JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_output: None,
            csv_output: None,
            include_samples: false,
            pretty: default_pretty(),
        }
    }
}

/// Process-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Validate and print the configuration, then exit
    #[serde(default)]
    pub dry_run: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

// Display trait implementations

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Input: {}", self.input)?;
        writeln!(f, "  Analysis: {}", self.analysis)?;
        writeln!(f, "  Output: {}", self.output)?;
        writeln!(f, "  Runtime: {}", self.runtime)?;
        Ok(())
    }
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Abort => write!(f, "abort"),
            OnError::Skip => write!(f, "skip"),
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogType::Tcp => write!(f, "tcp"),
            LogType::Ping => write!(f, "ping"),
        }
    }
}

impl fmt::Display for InputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} path(s), parallel={}, on_error={}",
            self.paths.len(),
            self.parallel,
            self.on_error
        )
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group_by={}, log_type={}, bins={}",
            self.group_by, self.log_type, self.bins
        )?;
        if let Some((lo, hi)) = self.range {
            write!(f, ", range=[{}, {}]", lo, hi)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref path) = self.json_output {
            parts.push(format!("json={}", path.display()));
        }
        if let Some(ref path) = self.csv_output {
            parts.push(format!("csv={}", path.display()));
        }
        if self.include_samples {
            parts.push("include_samples".to_string());
        }
        if parts.is_empty() {
            write!(f, "text output")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log_level={}", self.log_level)?;
        if self.dry_run {
            write!(f, ", dry_run")?;
        }
        Ok(())
    }
}
