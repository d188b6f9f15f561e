//! CLI to Config conversion utilities

use crate::config::cli::{GroupByArg, LogTypeArg, OnErrorArg};
use crate::config::{LogType, OnError};
use crate::stats::GroupBy;
use anyhow::{Context, Result};

/// Parse a `LO,HI` range string (e.g. "1e6,5e6", "0.5,20")
pub fn parse_range(s: &str) -> Result<(f64, f64)> {
    let (lo, hi) = s
        .split_once(',')
        .with_context(|| format!("Invalid range format (expected LO,HI): {}", s))?;

    let lo: f64 = lo
        .trim()
        .parse()
        .with_context(|| format!("Invalid range lower bound: {}", lo))?;
    let hi: f64 = hi
        .trim()
        .parse()
        .with_context(|| format!("Invalid range upper bound: {}", hi))?;

    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        anyhow::bail!("Invalid range: {} must not exceed {}", lo, hi);
    }

    Ok((lo, hi))
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Bitrate => GroupBy::Bitrate,
            GroupByArg::PayloadSize => GroupBy::PayloadSize,
        }
    }
}

impl From<OnErrorArg> for OnError {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::Abort => OnError::Abort,
            OnErrorArg::Skip => OnError::Skip,
        }
    }
}

impl From<LogTypeArg> for LogType {
    fn from(arg: LogTypeArg) -> Self {
        match arg {
            LogTypeArg::Tcp => LogType::Tcp,
            LogTypeArg::Ping => LogType::Ping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("1,2").unwrap(), (1.0, 2.0));
        assert_eq!(parse_range(" 1e6 , 5.5e6 ").unwrap(), (1e6, 5.5e6));
        assert_eq!(parse_range("3,3").unwrap(), (3.0, 3.0));
        assert!(parse_range("5").is_err());
        assert!(parse_range("a,2").is_err());
        assert!(parse_range("5,1").is_err());
        assert!(parse_range("1,inf").is_err());
    }

    #[test]
    fn test_enum_conversions() {
        assert_eq!(GroupBy::from(GroupByArg::PayloadSize), GroupBy::PayloadSize);
        assert_eq!(OnError::from(OnErrorArg::Skip), OnError::Skip);
        assert_eq!(LogType::from(LogTypeArg::Ping), LogType::Ping);
    }
}
