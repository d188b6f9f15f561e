//! Typed iperf3 reports
//!
//! A UDP report saved by the measurement runner looks like this:
//!
//! ```text
//! % iperf3 -u -c 192.168.0.102 -P 1 -t 10 -b 1000000 -l 16
//! [  5] local 192.168.0.103 port 62049 connected to 192.168.0.102 port 5201
//! [ ID] Interval           Transfer     Bitrate         Total Datagrams
//! [  5]   0.00-1.00   sec   122 KBytes   999 Kbits/sec  7808
//! ...
//! - - - - - - - - - - - - - - - - - - - - - - - - -
//! [ ID] Interval           Transfer     Bitrate         Jitter    Lost/Total Datagrams
//! [  5]   0.00-10.00  sec  1.19 MBytes  1000 Kbits/sec  0.000 ms  0/78120 (0%)  sender
//! [  5]   0.00-10.00  sec  1.19 MBytes  1000 Kbits/sec  0.073 ms  0/78120 (0%)  receiver
//! ```
//!
//! Line 0 is the recorded command line. The two rows after the `Lost/Total Datagrams`
//! header are the sender and receiver summaries. [`parser::parse_report`] decodes the
//! whole thing into a [`ParsedReport`] or rejects it.

pub mod intervals;
pub mod parser;

use crate::util::number::Number;
use serde::{Deserialize, Serialize};

pub use parser::{parse_report, parse_report_str, read_report};

/// Control parameters recovered from the recorded `iperf3` command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationParams {
    /// Server the client connected to (`-c`)
    pub host: String,
    /// Number of parallel client streams (`-P`)
    pub parallelism: u32,
    /// Test duration in seconds (`-t`), when given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    /// Target bitrate in bits/sec (`-b`)
    pub target_bitrate: u64,
    /// UDP payload length in bytes (`-l`)
    pub payload_size: u64,
}

/// One summary row of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionRecord {
    pub interval_start: f64,
    pub interval_end: f64,
    pub transfer_bytes: Number,
    pub bitrate_bps: Number,
    pub jitter_ms: f64,
    pub lost_datagrams: u64,
    pub total_datagrams: u64,
    pub loss_percent: f64,
}

/// Sender summary, which also carries the run's control parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderRecord {
    #[serde(flatten)]
    pub record: DirectionRecord,
    pub payload_size: u64,
    pub target_bitrate: u64,
}

/// A fully decoded report: both summaries are always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReport {
    pub invocation: InvocationParams,
    pub sender: SenderRecord,
    pub receiver: DirectionRecord,
}

impl ParsedReport {
    /// Sender bitrate in bits/sec
    pub fn send_bitrate(&self) -> f64 {
        self.sender.record.bitrate_bps.as_f64()
    }

    /// Receiver bitrate in bits/sec
    pub fn recv_bitrate(&self) -> f64 {
        self.receiver.bitrate_bps.as_f64()
    }

    /// Payload size used as the packet-rate denominator for both directions
    pub fn payload_size(&self) -> u64 {
        self.sender.payload_size
    }

    /// Target bitrate requested on the command line
    pub fn target_bitrate(&self) -> u64 {
        self.sender.target_bitrate
    }
}
