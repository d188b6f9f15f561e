//! Per-interval TCP rows and ping replies
//!
//! These logs have no summary block. Every matching line becomes a sample and every
//! other line is skipped, which is what the histogram/description mode feeds on.

use crate::error::ReportError;
use crate::util::number::{normalize, Number};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `[  5]   0.00-1.00   sec  1.22 MBytes  10.2 Mbits/sec`
static INTERVAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\[\s*\d+\]\s*",
        r"(?P<start>[\d.]+)-(?P<end>[\d.]+)\s+sec\s+",
        r"(?P<transfer>[\d.]+)\s+(?P<transfer_unit>[kKmMgG]?)Bytes\s+",
        r"(?P<bitrate>[\d.]+)\s+(?P<bitrate_unit>[kKmMgG]?)bits/sec",
    ))
    .expect("interval pattern is valid")
});

/// `64 bytes from 1.1.1.1: icmp_seq=109 ttl=63 time=2.196 ms`
static PING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<size>\d+) bytes from [\da-fA-F.:]+: ",
        r"icmp_seq=(?P<seq>\d+) ",
        r"ttl=(?P<ttl>\d+) ",
        r"time=(?P<rtt>[\d.]+) ms",
    ))
    .expect("ping pattern is valid")
});

/// One per-interval throughput row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSample {
    pub start: f64,
    pub end: f64,
    pub transfer_bytes: Number,
    pub bitrate_bps: Number,
}

/// One ICMP echo reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingReply {
    pub size: u64,
    pub seq: u64,
    pub ttl: u32,
    pub rtt_ms: f64,
}

fn malformed(token: &str) -> ReportError {
    ReportError::MalformedNumber {
        token: token.to_string(),
    }
}

/// Extract every per-interval row from a TCP (or UDP) iperf3 log
///
/// The UDP summary rows also match this pattern; callers describing TCP throughput
/// should feed TCP logs.
pub fn parse_tcp_intervals<S: AsRef<str>>(lines: &[S]) -> Result<Vec<IntervalSample>, ReportError> {
    let mut samples = Vec::new();

    for line in lines {
        let Some(caps) = INTERVAL_RE.captures(line.as_ref()) else {
            continue;
        };

        let start = &caps["start"];
        let end = &caps["end"];
        samples.push(IntervalSample {
            start: start.parse().map_err(|_| malformed(start))?,
            end: end.parse().map_err(|_| malformed(end))?,
            transfer_bytes: normalize(&format!("{}{}", &caps["transfer"], &caps["transfer_unit"]))?,
            bitrate_bps: normalize(&format!("{}{}", &caps["bitrate"], &caps["bitrate_unit"]))?,
        });
    }

    Ok(samples)
}

/// Extract every echo reply from `ping` output
pub fn parse_ping_replies<S: AsRef<str>>(lines: &[S]) -> Result<Vec<PingReply>, ReportError> {
    let mut replies = Vec::new();

    for line in lines {
        let Some(caps) = PING_RE.captures(line.as_ref()) else {
            continue;
        };

        let rtt = &caps["rtt"];
        replies.push(PingReply {
            size: caps["size"].parse().map_err(|_| malformed(&caps["size"]))?,
            seq: caps["seq"].parse().map_err(|_| malformed(&caps["seq"]))?,
            ttl: caps["ttl"].parse().map_err(|_| malformed(&caps["ttl"]))?,
            rtt_ms: rtt.parse().map_err(|_| malformed(rtt))?,
        });
    }

    Ok(replies)
}

/// Read a TCP iperf3 log file
pub fn read_tcp_intervals(path: &Path) -> crate::Result<Vec<IntervalSample>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log: {}", path.display()))?;
    let lines: Vec<&str> = contents.lines().collect();
    parse_tcp_intervals(&lines)
        .with_context(|| format!("Failed to parse interval rows: {}", path.display()))
}

/// Read a ping log file
pub fn read_ping_replies(path: &Path) -> crate::Result<Vec<PingReply>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log: {}", path.display()))?;
    let lines: Vec<&str> = contents.lines().collect();
    parse_ping_replies(&lines)
        .with_context(|| format!("Failed to parse ping replies: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_LOG: &str = "\
Connecting to host 192.168.0.102, port 5201
[  5] local 192.168.0.103 port 50000 connected to 192.168.0.102 port 5201
[ ID] Interval           Transfer     Bitrate
[  5]   0.00-1.00   sec  1.22 MBytes  10.2 Mbits/sec
[  5]   1.00-2.00   sec  1.25 MBytes  10.5 Mbits/sec
[  5]   2.00-3.00   sec   512 KBytes  4195 Kbits/sec
- - - - - - - - - - - - - - - - - - - - - - - - -
iperf Done.
";

    const PING_LOG: &str = "\
PING 1.1.1.1 (1.1.1.1): 56 data bytes
64 bytes from 1.1.1.1: icmp_seq=0 ttl=63 time=2.196 ms
64 bytes from 1.1.1.1: icmp_seq=1 ttl=63 time=3.010 ms
Request timeout for icmp_seq 2
64 bytes from 1.1.1.1: icmp_seq=3 ttl=63 time=1.5 ms
";

    #[test]
    fn test_parse_tcp_intervals() {
        let lines: Vec<&str> = TCP_LOG.lines().collect();
        let samples = parse_tcp_intervals(&lines).unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].start, 0.0);
        assert_eq!(samples[0].end, 1.0);
        assert!(!samples[0].bitrate_bps.is_int());
        assert!((samples[0].bitrate_bps.as_f64() - 10_200_000.0).abs() < 1e-6);
        assert_eq!(samples[2].transfer_bytes, Number::Int(512_000));
        assert_eq!(samples[2].bitrate_bps, Number::Int(4_195_000));
    }

    #[test]
    fn test_parse_tcp_intervals_empty() {
        let lines = ["nothing to see", "iperf Done."];
        assert!(parse_tcp_intervals(&lines).unwrap().is_empty());
    }

    #[test]
    fn test_parse_tcp_intervals_rejects_bad_number() {
        let lines = ["[  5]   0.00-1.00   sec  1.2.2 MBytes  10.2 Mbits/sec"];
        let err = parse_tcp_intervals(&lines).unwrap_err();
        assert!(matches!(err, ReportError::MalformedNumber { .. }));
    }

    #[test]
    fn test_parse_ping_replies() {
        let lines: Vec<&str> = PING_LOG.lines().collect();
        let replies = parse_ping_replies(&lines).unwrap();

        assert_eq!(replies.len(), 3);
        assert_eq!(
            replies[0],
            PingReply {
                size: 64,
                seq: 0,
                ttl: 63,
                rtt_ms: 2.196
            }
        );
        assert_eq!(replies[2].seq, 3);
        assert_eq!(replies[2].rtt_ms, 1.5);
    }

    #[test]
    fn test_parse_ping_ipv6_reply() {
        let lines = ["16 bytes from 2606:4700:4700::1111: icmp_seq=4 ttl=57 time=9.8 ms"];
        let replies = parse_ping_replies(&lines).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].size, 16);
    }

    #[test]
    fn test_read_logs_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let tcp = dir.path().join("tcp.txt");
        let ping = dir.path().join("ping.txt");
        fs::write(&tcp, TCP_LOG).unwrap();
        fs::write(&ping, PING_LOG).unwrap();

        assert_eq!(read_tcp_intervals(&tcp).unwrap().len(), 3);
        assert_eq!(read_ping_replies(&ping).unwrap().len(), 3);
    }
}
