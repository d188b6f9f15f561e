//! iperfstat - iperf3 report parsing and aggregation
//!
//! iperfstat reads saved iperf3 UDP client reports, decodes the recorded command line and
//! the sender/receiver summary rows, and folds repeated runs into per-bucket means keyed
//! by target bitrate and payload size.
//!
//! # Architecture
//!
//! - **report**: line parsers for UDP reports, TCP interval rows and ping replies
//! - **stats**: two-key aggregation and descriptive statistics
//! - **output**: text tables, JSON documents, CSV files
//! - **input** and **config**: file loading, error policy, CLI and TOML settings

pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod report;
pub mod stats;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use error::ReportError;
pub use report::{parse_report, ParsedReport};
pub use stats::{AggregatedResult, GroupBy};

/// Result type used throughout iperfstat
pub type Result<T> = anyhow::Result<T>;
