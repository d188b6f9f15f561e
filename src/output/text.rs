//! Human-readable text output

use crate::stats::describe::{BinCount, Description};
use crate::stats::{AggregatedResult, GroupBy};
use crate::util::format::{format_bitrate, format_number, format_rate, round_to, to_mbps};
use std::fmt::Write;

const COLUMNS: [(&str, usize); 9] = [
    ("Tgt BW", 8),
    ("Snd BW", 8),
    ("PL Size", 8),
    ("Rcv BW", 8),
    ("Snd PPS", 9),
    ("Rcv PPS", 9),
    ("lost%", 7),
    ("jitter", 7),
    ("n", 4),
];

/// Render the aggregated buckets as a table
///
/// Rows follow ascending key order on both levels. Bitrates are shown in Mbps rounded to
/// two places, loss and jitter to three.
pub fn render_summary(result: &AggregatedResult, group_by: GroupBy) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Grouped by {} ({} runs, {} buckets)", group_by, result.total_samples(), result.len());
    let header: Vec<String> = COLUMNS.iter().map(|(name, w)| format!("{:>w$}", name, w = w)).collect();
    let _ = writeln!(out, "{}", header.join(" "));
    let rule: Vec<String> = COLUMNS.iter().map(|(_, w)| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join(" "));

    for (_, _, bucket) in result.iter() {
        let cells = [
            to_mbps(bucket.target_bitrate as f64).to_string(),
            to_mbps(bucket.send_bitrate).to_string(),
            bucket.payload_size.to_string(),
            to_mbps(bucket.recv_bitrate).to_string(),
            format_rate(bucket.send_pps),
            format_rate(bucket.recv_pps),
            round_to(bucket.loss_percent, 3).to_string(),
            round_to(bucket.jitter_ms, 3).to_string(),
            bucket.sample_count.to_string(),
        ];
        let row: Vec<String> = cells
            .iter()
            .zip(COLUMNS.iter())
            .map(|(cell, (_, w))| format!("{:>w$}", cell, w = w))
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }

    out
}

/// Print the aggregated buckets to stdout
pub fn print_summary(result: &AggregatedResult, group_by: GroupBy) {
    println!("═══════════════════════════════════════════════════════════════════════════");
    println!("                           THROUGHPUT SUMMARY");
    println!("═══════════════════════════════════════════════════════════════════════════");
    print!("{}", render_summary(result, group_by));
    println!("═══════════════════════════════════════════════════════════════════════════");
}

/// Render a description and its frequency bins
///
/// `scale` divides values for display (1e6 shows bits/sec as Mbps, 1 leaves ms as is).
pub fn render_description(label: &str, description: &Description, bins: &[BinCount], scale: f64) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "## Description: {}", label);
    let _ = writeln!(out, "count  {}", format_number(description.count as u64));
    let _ = writeln!(out, "mean   {:.6}", description.mean / scale);
    match description.std {
        Some(std) => {
            let _ = writeln!(out, "std    {:.6}", std / scale);
        }
        None => {
            let _ = writeln!(out, "std    NaN");
        }
    }
    let _ = writeln!(out, "min    {:.6}", description.min / scale);
    let _ = writeln!(out, "25%    {:.6}", description.p25 / scale);
    let _ = writeln!(out, "50%    {:.6}", description.p50 / scale);
    let _ = writeln!(out, "75%    {:.6}", description.p75 / scale);
    let _ = writeln!(out, "max    {:.6}", description.max / scale);

    if !bins.is_empty() {
        let _ = writeln!(out, "## Freq");
        for bin in bins {
            let _ = writeln!(
                out,
                "({:>10.3}, {:>10.3}]  {:>6}  {}",
                bin.lo / scale,
                bin.hi / scale,
                bin.count,
                "#".repeat(bin.count.min(60))
            );
        }
    }

    out
}

/// One-line description of a single report, used by the parse mode's log output
pub fn describe_bitrates(send_bps: f64, recv_bps: f64) -> String {
    format!("sent {} / received {}", format_bitrate(send_bps), format_bitrate(recv_bps))
}
