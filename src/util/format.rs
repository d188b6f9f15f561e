//! Human-readable formatting helpers for bitrates and packet rates

/// Format a rate with an SI magnitude suffix
///
/// # Examples
///
/// ```
/// use iperfstat::util::format::format_rate;
///
/// assert_eq!(format_rate(500.0), "500");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.0}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else if rate < 1_000_000_000.0 {
        format!("{:.2}M", rate / 1_000_000.0)
    } else {
        format!("{:.2}G", rate / 1_000_000_000.0)
    }
}

/// Format a bitrate the way iperf3 prints it (decimal units, bits/sec)
///
/// # Examples
///
/// ```
/// use iperfstat::util::format::format_bitrate;
///
/// assert_eq!(format_bitrate(12_800.0), "12.80 Kbits/sec");
/// assert_eq!(format_bitrate(940_000_000.0), "940.00 Mbits/sec");
/// ```
pub fn format_bitrate(bps: f64) -> String {
    if bps >= 1e9 {
        format!("{:.2} Gbits/sec", bps / 1e9)
    } else if bps >= 1e6 {
        format!("{:.2} Mbits/sec", bps / 1e6)
    } else if bps >= 1e3 {
        format!("{:.2} Kbits/sec", bps / 1e3)
    } else {
        format!("{:.2} bits/sec", bps)
    }
}

/// Convert bits/sec to Mbps rounded to two decimal places
pub fn to_mbps(bps: f64) -> f64 {
    round_to(bps / 1e6, 2)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format a count with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
