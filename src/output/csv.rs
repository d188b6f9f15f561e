//! CSV output formatting
//!
//! One header row, then one row per bucket in ascending key order. Floats are written with
//! `{}` so they round-trip exactly.

use crate::stats::{AggregatedResult, Bucket, GroupBy};
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const HEADER: &str = "target_bitrate,payload_size,sample_count,send_bitrate,recv_bitrate,send_pps,recv_pps,loss_percent,jitter_ms";

/// CSV writer for aggregated buckets
pub struct CsvWriter<W: Write> {
    out: W,
    group_by: GroupBy,
}

impl CsvWriter<BufWriter<File>> {
    /// Create the file and write the header row
    pub fn create(path: &Path, group_by: GroupBy) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV output: {}", path.display()))?;
        Self::new(BufWriter::new(file), group_by)
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn new(mut out: W, group_by: GroupBy) -> Result<Self> {
        let (outer, inner) = key_columns(group_by);
        writeln!(out, "{},{},{}", outer, inner, HEADER)?;
        Ok(Self { out, group_by })
    }

    pub fn append_bucket(&mut self, outer: u64, inner: u64, bucket: &Bucket) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            outer,
            inner,
            bucket.target_bitrate,
            bucket.payload_size,
            bucket.sample_count,
            bucket.send_bitrate,
            bucket.recv_bitrate,
            bucket.send_pps,
            bucket.recv_pps,
            bucket.loss_percent,
            bucket.jitter_ms,
        )?;
        Ok(())
    }

    /// Append every bucket of a result
    pub fn write_result(&mut self, result: &AggregatedResult) -> Result<()> {
        for (outer, inner, bucket) in result.iter() {
            self.append_bucket(outer, inner, bucket)?;
        }
        Ok(())
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Column names for the two grouping keys, outer first
fn key_columns(group_by: GroupBy) -> (&'static str, &'static str) {
    match group_by {
        GroupBy::Bitrate => ("group_bitrate", "group_payload_size"),
        GroupBy::PayloadSize => ("group_payload_size", "group_bitrate"),
    }
}

/// Write a whole result to `path`
pub fn write_csv_output(path: &Path, result: &AggregatedResult, group_by: GroupBy) -> Result<()> {
    let mut writer = CsvWriter::create(path, group_by)?;
    writer.write_result(result)?;
    writer.finish()?;
    Ok(())
}
