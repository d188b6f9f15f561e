//! JSON output formatting
//!
//! The summary document wraps an [`AggregatedResult`] with a timestamp and the grouping
//! axis. `serde_json` writes `f64` values in shortest round-trip form, so averaged fields
//! keep full precision.

use crate::report::ParsedReport;
use crate::stats::{AggregatedResult, GroupBy};
use crate::Result;
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level JSON document for a summary run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// RFC 3339 UTC timestamp
    pub generated_at: String,
    pub group_by: GroupBy,
    pub total_samples: usize,
    pub bucket_count: usize,
    /// outer key → inner key → bucket
    pub groups: AggregatedResult,
}

impl JsonSummary {
    /// Build the document; sample lists are dropped unless `include_samples` is set
    pub fn new(result: &AggregatedResult, group_by: GroupBy, include_samples: bool) -> Self {
        let groups = if include_samples {
            result.clone()
        } else {
            result.without_samples()
        };

        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            group_by,
            total_samples: result.total_samples(),
            bucket_count: result.len(),
            groups,
        }
    }
}

/// Parsed report tagged with its source, for the parse mode
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub source_name: &'a str,
    #[serde(flatten)]
    pub report: ParsedReport,
}

/// Write the summary document to a file
pub fn write_json_output(output_path: &Path, summary: &JsonSummary, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, summary)?;
    } else {
        serde_json::to_writer(&mut writer, summary)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write JSON output: {}", output_path.display()))?;

    Ok(())
}

/// Serialize a parsed report for display
pub fn report_to_json(source_name: &str, report: &ParsedReport) -> Result<String> {
    let doc = JsonReport {
        source_name,
        report: report.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
