//! Input loading
//!
//! Expands glob patterns, reads report files and applies the configured [`OnError`]
//! policy. Files are parsed on the rayon pool when `parallel` is set; results keep the
//! order of the expanded path list either way.

use crate::config::{LogType, OnError};
use crate::report::intervals::{read_ping_replies, read_tcp_intervals};
use crate::report::{read_report, ParsedReport};
use crate::Result;
use anyhow::Context;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Expand files and glob patterns into a path list
///
/// Plain paths pass through unchanged, so a missing file surfaces as a read error later.
/// A pattern that matches nothing is logged and contributes no paths.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if !is_glob(pattern) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let before = paths.len();
        let entries = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        for entry in entries {
            let path = entry.with_context(|| format!("Failed to expand pattern: {}", pattern))?;
            if path.is_file() {
                paths.push(path);
            }
        }

        let matched = paths.len() - before;
        if matched == 0 {
            warn!(pattern = %pattern, "pattern matched no files");
        } else {
            debug!(pattern = %pattern, matched, "expanded pattern");
        }
    }

    Ok(paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Run `load` over every path and apply the error policy
fn load_all<T, F>(paths: &[PathBuf], parallel: bool, on_error: OnError, load: F) -> Result<Vec<(PathBuf, T)>>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync + Send,
{
    let results: Vec<Result<T>> = if parallel {
        paths.par_iter().map(|path| load(path)).collect()
    } else {
        paths.iter().map(|path| load(path)).collect()
    };

    let mut loaded = Vec::with_capacity(results.len());
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(value) => loaded.push((path.clone(), value)),
            Err(e) => match on_error {
                OnError::Abort => return Err(e),
                OnError::Skip => warn!(path = %path.display(), "skipping file: {:#}", e),
            },
        }
    }

    Ok(loaded)
}

/// Read and parse UDP reports
///
/// Each report is paired with its source name (the path as given or expanded). Under
/// [`OnError::Skip`] the result may be empty; aggregation then reports empty input.
pub fn load_reports(paths: &[PathBuf], parallel: bool, on_error: OnError) -> Result<Vec<(String, ParsedReport)>> {
    let loaded = load_all(paths, parallel, on_error, read_report)?;
    info!(loaded = loaded.len(), total = paths.len(), "loaded reports");

    Ok(loaded
        .into_iter()
        .map(|(path, report)| (path.display().to_string(), report))
        .collect())
}

/// Read per-interval values for the describe mode
///
/// TCP logs yield bitrates in bits/sec, ping logs round-trip times in ms. Values from all
/// files are concatenated in path order.
pub fn load_values(paths: &[PathBuf], log_type: LogType, parallel: bool, on_error: OnError) -> Result<Vec<f64>> {
    let loaded = match log_type {
        LogType::Tcp => load_all(paths, parallel, on_error, |path| {
            let samples = read_tcp_intervals(path)?;
            Ok(samples.iter().map(|s| s.bitrate_bps.as_f64()).collect::<Vec<f64>>())
        })?,
        LogType::Ping => load_all(paths, parallel, on_error, |path| {
            let replies = read_ping_replies(path)?;
            Ok(replies.iter().map(|r| r.rtt_ms).collect::<Vec<f64>>())
        })?,
    };

    let values: Vec<f64> = loaded.into_iter().flat_map(|(_, values)| values).collect();
    info!(values = values.len(), files = paths.len(), log_type = %log_type, "loaded samples");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parser::tests::{synthetic_report, SMALL_PAYLOAD_REPORT};
    use std::fs;
    use tempfile::TempDir;

    fn write_reports(dir: &TempDir) -> Vec<PathBuf> {
        let files = [
            ("run-1.txt", synthetic_report("1m", 16, "1000000", "999000")),
            ("run-2.txt", SMALL_PAYLOAD_REPORT.to_string()),
            ("broken.txt", "% iperf3 -u -c host\nno summary here\n".to_string()),
        ];
        files
            .iter()
            .map(|(name, text)| {
                let path = dir.path().join(name);
                fs::write(&path, text).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_expand_inputs_glob() {
        let dir = tempfile::tempdir().unwrap();
        write_reports(&dir);

        let pattern = format!("{}/run-*.txt", dir.path().display());
        let paths = expand_inputs(&[pattern]).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("run-1.txt"));
        assert!(paths[1].ends_with("run-2.txt"));
    }

    #[test]
    fn test_expand_inputs_plain_and_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        let unmatched = format!("{}/nothing-*.txt", dir.path().display());
        let paths = expand_inputs(&["missing.txt".to_string(), unmatched]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("missing.txt")]);
    }

    #[test]
    fn test_expand_inputs_bad_pattern() {
        assert!(expand_inputs(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_skip_policy_keeps_good_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reports(&dir);

        for parallel in [true, false] {
            let reports = load_reports(&paths, parallel, OnError::Skip).unwrap();
            assert_eq!(reports.len(), 2);
            assert!(reports[0].0.ends_with("run-1.txt"));
            assert!(reports[1].0.ends_with("run-2.txt"));
            assert_eq!(reports[0].1.payload_size(), 16);
        }
    }

    #[test]
    fn test_abort_policy_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reports(&dir);

        let err = load_reports(&paths, true, OnError::Abort).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.txt"));
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let paths = vec![PathBuf::from("/nonexistent/run.txt")];
        assert!(load_reports(&paths, false, OnError::Skip).unwrap().is_empty());
        assert!(load_reports(&paths, false, OnError::Abort).is_err());
    }

    #[test]
    fn test_load_values_ping() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        fs::write(&a, "64 bytes from 1.1.1.1: icmp_seq=0 ttl=63 time=2.5 ms\n").unwrap();
        fs::write(
            &b,
            "PING 1.1.1.1 (1.1.1.1): 56 data bytes\n64 bytes from 1.1.1.1: icmp_seq=1 ttl=63 time=1.25 ms\n",
        )
        .unwrap();

        let values = load_values(&[a, b], LogType::Ping, true, OnError::Abort).unwrap();
        assert_eq!(values, vec![2.5, 1.25]);
    }

    #[test]
    fn test_load_values_tcp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tcp.log");
        fs::write(
            &path,
            "[  5]   0.00-1.00   sec   512 KBytes  4195 Kbits/sec\n[  5]   1.00-2.00   sec   500 KBytes  4000 Kbits/sec\n",
        )
        .unwrap();

        let values = load_values(&[path], LogType::Tcp, false, OnError::Abort).unwrap();
        assert_eq!(values, vec![4_195_000.0, 4_000_000.0]);
    }
}
