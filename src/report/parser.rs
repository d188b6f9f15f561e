//! iperf3 UDP report parser
//!
//! The parser works on the lines of one saved report. It locates the summary anchor,
//! decodes the recorded command line, then decodes exactly two summary rows in the fixed
//! order sender, receiver. Any deviation rejects the whole report.

use super::{DirectionRecord, InvocationParams, ParsedReport, SenderRecord};
use crate::error::ReportError;
use crate::util::number::normalize;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use tracing::trace;

/// Recorded command line, e.g. `% iperf3 -u -c 10.0.0.2 -P 1 -t 10 -b 940m -l 1448`
static INVOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^% iperf3 -u ",
        r"-c (?P<host>\S+) ",
        r"-P (?P<parallel>\d+) ",
        r"(?:-t (?P<time>\d+) )?",
        r"-b (?P<bw>\d+[kKmMgG]?) ",
        r"-l (?P<psize>\d+)",
    ))
    .expect("invocation pattern is valid")
});

/// Header row that precedes the sender/receiver summary block
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\s*ID\]\s*Interval\s+.*Lost/Total Datagrams")
        .expect("anchor pattern is valid")
});

/// Sender or receiver summary row
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\[\s*\d+\]\s*",
        r"(?P<start>[\d.]+)-(?P<end>[\d.]+)\s+sec\s+",
        r"(?P<transfer>[\d.]+)\s+(?P<transfer_unit>[kKmMgG]?)Bytes\s+",
        r"(?P<bitrate>[\d.]+)\s+(?P<bitrate_unit>[kKmMgG]?)bits/sec\s+",
        r"(?P<jitter>[\d.]+)\s+ms\s+",
        r"(?P<lost>\d+)/(?P<total>\d+)\s+",
        r"\((?P<loss>[\d.]+(?:[eE][-+]?\d+)?)%\)\s+",
        r"(?P<role>sender|receiver)",
    ))
    .expect("summary pattern is valid")
});

/// Direction label expected at the end of a summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Sender,
    Receiver,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Sender => "sender",
            Role::Receiver => "receiver",
        }
    }
}

/// Parse the lines of one report
///
/// `source_name` only labels errors. Fails with [`ReportError::InvalidStructure`] when the
/// anchor or a summary row is missing, [`ReportError::InvalidInvocation`] when line 0 is
/// not a recorded `iperf3 -u` command, and [`ReportError::InvalidRole`] when the summary
/// rows are out of order.
pub fn parse_report<S: AsRef<str>>(
    lines: &[S],
    source_name: &str,
) -> Result<ParsedReport, ReportError> {
    let anchor = lines
        .iter()
        .position(|line| ANCHOR_RE.is_match(line.as_ref()))
        .ok_or_else(|| ReportError::structure(source_name, "summary anchor not found"))?;
    trace!(source = source_name, anchor, "found summary anchor");

    let invocation = lines
        .first()
        .and_then(|line| parse_invocation(line.as_ref()))
        .ok_or_else(|| ReportError::InvalidInvocation {
            source_name: source_name.to_string(),
        })?;

    let sender = parse_summary_row(lines.get(anchor + 1), Role::Sender, source_name)?;
    let receiver = parse_summary_row(lines.get(anchor + 2), Role::Receiver, source_name)?;

    Ok(ParsedReport {
        sender: SenderRecord {
            record: sender,
            payload_size: invocation.payload_size,
            target_bitrate: invocation.target_bitrate,
        },
        receiver,
        invocation,
    })
}

/// Parse a whole report held in memory
pub fn parse_report_str(text: &str, source_name: &str) -> Result<ParsedReport, ReportError> {
    let lines: Vec<&str> = text.lines().collect();
    parse_report(&lines, source_name)
}

/// Read and parse one report file
pub fn read_report(path: &Path) -> crate::Result<ParsedReport> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;

    let report = parse_report_str(&contents, &path.display().to_string())?;
    Ok(report)
}

/// Decode the recorded command line; `None` if the grammar does not match
fn parse_invocation(line: &str) -> Option<InvocationParams> {
    let caps = INVOCATION_RE.captures(line)?;

    let target_bitrate = normalize(&caps["bw"]).ok()?.as_u64()?;
    let duration_secs = match caps.name("time") {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };

    // iperf3 refuses a zero-length payload; treat it as a foreign command line
    let payload_size = caps["psize"].parse().ok().filter(|&n: &u64| n > 0)?;

    Some(InvocationParams {
        host: caps["host"].to_string(),
        parallelism: caps["parallel"].parse().ok()?,
        duration_secs,
        target_bitrate,
        payload_size,
    })
}

fn parse_summary_row<S: AsRef<str>>(
    line: Option<&S>,
    expected: Role,
    source_name: &str,
) -> Result<DirectionRecord, ReportError> {
    let line: &str = match line {
        Some(line) => line.as_ref(),
        None => {
            return Err(ReportError::structure(
                source_name,
                format!("{} summary row missing", expected.as_str()),
            ))
        }
    };

    let caps = SUMMARY_RE.captures(line).ok_or_else(|| {
        ReportError::structure(
            source_name,
            format!("{} summary row malformed: {:?}", expected.as_str(), line.trim()),
        )
    })?;

    let role = &caps["role"];
    if role != expected.as_str() {
        return Err(ReportError::InvalidRole {
            source_name: source_name.to_string(),
            expected: expected.as_str(),
            found: role.to_string(),
        });
    }

    decode_summary(&caps).map_err(|field| {
        ReportError::structure(
            source_name,
            format!("{} summary row has a bad {} field", expected.as_str(), field),
        )
    })
}

/// Convert captured fields; the error names the offending field
fn decode_summary(caps: &Captures<'_>) -> Result<DirectionRecord, &'static str> {
    fn float(caps: &Captures<'_>, name: &'static str) -> Result<f64, &'static str> {
        caps[name]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(name)
    }
    fn int(caps: &Captures<'_>, name: &'static str) -> Result<u64, &'static str> {
        caps[name].parse().map_err(|_| name)
    }

    let transfer = format!("{}{}", &caps["transfer"], &caps["transfer_unit"]);
    let bitrate = format!("{}{}", &caps["bitrate"], &caps["bitrate_unit"]);

    Ok(DirectionRecord {
        interval_start: float(caps, "start")?,
        interval_end: float(caps, "end")?,
        transfer_bytes: normalize(&transfer).map_err(|_| "transfer")?,
        bitrate_bps: normalize(&bitrate).map_err(|_| "bitrate")?,
        jitter_ms: float(caps, "jitter")?,
        lost_datagrams: int(caps, "lost")?,
        total_datagrams: int(caps, "total")?,
        loss_percent: float(caps, "loss")?,
    })
}
