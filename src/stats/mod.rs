//! Aggregated statistics over repeated runs
//!
//! Repeated iperf3 runs with the same target bitrate and payload size are folded into a
//! [`Bucket`]. Buckets live in a two-level map keyed by `(outer, inner)`, where the caller
//! picks which of bitrate and payload size is the outer axis via [`GroupBy`].
//!
//! # Example
//!
//! ```
//! use iperfstat::report::parse_report_str;
//! use iperfstat::stats::{aggregator::aggregate_by, GroupBy};
//!
//! let text = "\
//! % iperf3 -u -c host -P 1 -b 1m -l 16
//! [ ID] Interval           Transfer     Bitrate         Jitter    Lost/Total Datagrams
//! [  5]   0.00-10.00  sec  1.19 MBytes  1000 Kbits/sec  0.000 ms  0/78120 (0%)  sender
//! [  5]   0.00-10.00  sec  1.19 MBytes  1000 Kbits/sec  0.073 ms  0/78120 (0%)  receiver
//! ";
//! let report = parse_report_str(text, "run-1").unwrap();
//! let result = aggregate_by(vec![("run-1".to_string(), report)], GroupBy::Bitrate).unwrap();
//!
//! let bucket = result.get(1_000_000, 16).unwrap();
//! assert_eq!(bucket.sample_count, 1);
//! assert_eq!(bucket.send_bitrate, 1_000_000.0);
//! ```

pub mod aggregator;
pub mod describe;

use crate::report::ParsedReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which control parameter forms the outer grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    /// Outer key target bitrate, inner key payload size
    #[default]
    Bitrate,
    /// Outer key payload size, inner key target bitrate
    PayloadSize,
}

impl GroupBy {
    /// `(outer, inner)` key of a report
    pub fn key(self, report: &ParsedReport) -> (u64, u64) {
        match self {
            GroupBy::Bitrate => (report.target_bitrate(), report.payload_size()),
            GroupBy::PayloadSize => (report.payload_size(), report.target_bitrate()),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Bitrate => write!(f, "bitrate"),
            GroupBy::PayloadSize => write!(f, "payload-size"),
        }
    }
}

/// Packets per second derived from a bitrate and a payload size
///
/// `bps / 8 / payload_size * 1e6`. A zero payload size yields zero.
pub fn packets_per_second(bps: f64, payload_size: u64) -> f64 {
    if payload_size == 0 {
        return 0.0;
    }
    bps / 8.0 / payload_size as f64 * 1e6
}

/// Per-report metrics that feed a bucket
///
/// Packet rates for both directions divide by the sender's payload size. Loss and jitter
/// come from the receiver row, since iperf3 always reports zero jitter on the sender side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleMetrics {
    pub send_bitrate: f64,
    pub recv_bitrate: f64,
    pub send_pps: f64,
    pub recv_pps: f64,
    pub loss_percent: f64,
    pub jitter_ms: f64,
}

impl SampleMetrics {
    pub fn from_report(report: &ParsedReport) -> Self {
        let payload_size = report.payload_size();
        let send_bitrate = report.send_bitrate();
        let recv_bitrate = report.recv_bitrate();

        Self {
            send_bitrate,
            recv_bitrate,
            send_pps: packets_per_second(send_bitrate, payload_size),
            recv_pps: packets_per_second(recv_bitrate, payload_size),
            loss_percent: report.receiver.loss_percent,
            jitter_ms: report.receiver.jitter_ms,
        }
    }
}

/// A report together with the name of the file it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub source_name: String,
    pub report: ParsedReport,
}

/// Finalized statistics for one `(outer, inner)` key pair
///
/// Metric fields hold the mean over `sample_count` samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub sample_count: usize,
    /// Target bitrate of the first sample in the bucket
    pub target_bitrate: u64,
    /// Payload size of the first sample in the bucket
    pub payload_size: u64,
    pub send_bitrate: f64,
    pub recv_bitrate: f64,
    pub send_pps: f64,
    pub recv_pps: f64,
    pub loss_percent: f64,
    pub jitter_ms: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<Sample>,
}

/// Two-level map of finalized buckets, iterated in ascending key order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedResult {
    groups: BTreeMap<u64, BTreeMap<u64, Bucket>>,
}

impl AggregatedResult {
    pub(crate) fn new(groups: BTreeMap<u64, BTreeMap<u64, Bucket>>) -> Self {
        Self { groups }
    }

    /// Bucket at `(outer, inner)`
    pub fn get(&self, outer: u64, inner: u64) -> Option<&Bucket> {
        self.groups.get(&outer)?.get(&inner)
    }

    /// Inner map for one outer key
    pub fn group(&self, outer: u64) -> Option<&BTreeMap<u64, Bucket>> {
        self.groups.get(&outer)
    }

    /// Outer keys in ascending order
    pub fn outer_keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.groups.keys().copied()
    }

    /// All buckets as `(outer, inner, bucket)`, ascending on both keys
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64, &Bucket)> + '_ {
        self.groups.iter().flat_map(|(&outer, inner)| {
            inner.iter().map(move |(&inner_key, bucket)| (outer, inner_key, bucket))
        })
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Always false for a result produced by the aggregator
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of reports across all buckets
    pub fn total_samples(&self) -> usize {
        self.iter().map(|(_, _, bucket)| bucket.sample_count).sum()
    }

    /// Copy without the per-bucket sample lists
    pub fn without_samples(&self) -> Self {
        let groups = self
            .groups
            .iter()
            .map(|(&outer, inner)| {
                let inner = inner
                    .iter()
                    .map(|(&key, bucket)| {
                        (
                            key,
                            Bucket {
                                samples: Vec::new(),
                                ..bucket.clone()
                            },
                        )
                    })
                    .collect();
                (outer, inner)
            })
            .collect();
        Self { groups }
    }
}
