//! Result aggregation
//!
//! [`ResultAggregator`] is the aggregation context: reports are added one by one into
//! mutable accumulators addressed by an explicit `(outer, inner)` key, and
//! [`ResultAggregator::finalize`] turns every accumulator into a [`Bucket`] of means. The
//! divide step runs once, after every sample for a bucket has been added.
//!
//! # Usage
//!
//! 1. Create an aggregator with `new()`
//! 2. Add reports with `add()` (or combine partial aggregators with `merge()`)
//! 3. Consume it with `finalize()`
//!
//! [`aggregate`], [`aggregate_by`] and [`aggregate_parallel`] wrap these steps.

use crate::error::ReportError;
use crate::report::ParsedReport;
use crate::stats::{AggregatedResult, Bucket, GroupBy, Sample, SampleMetrics};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Running sums for one key pair
#[derive(Debug, Default)]
struct Accumulator {
    sample_count: usize,
    target_bitrate: u64,
    payload_size: u64,
    sums: SampleMetrics,
    samples: Vec<Sample>,
}

impl Accumulator {
    fn add(&mut self, sample: Sample) {
        let metrics = SampleMetrics::from_report(&sample.report);

        if self.sample_count == 0 {
            self.target_bitrate = sample.report.target_bitrate();
            self.payload_size = sample.report.payload_size();
        }
        self.sums.send_bitrate += metrics.send_bitrate;
        self.sums.recv_bitrate += metrics.recv_bitrate;
        self.sums.send_pps += metrics.send_pps;
        self.sums.recv_pps += metrics.recv_pps;
        self.sums.loss_percent += metrics.loss_percent;
        self.sums.jitter_ms += metrics.jitter_ms;
        self.sample_count += 1;
        self.samples.push(sample);
    }

    fn merge(&mut self, other: Accumulator) {
        if other.sample_count == 0 {
            return;
        }
        if self.sample_count == 0 {
            self.target_bitrate = other.target_bitrate;
            self.payload_size = other.payload_size;
        }
        self.sums.send_bitrate += other.sums.send_bitrate;
        self.sums.recv_bitrate += other.sums.recv_bitrate;
        self.sums.send_pps += other.sums.send_pps;
        self.sums.recv_pps += other.sums.recv_pps;
        self.sums.loss_percent += other.sums.loss_percent;
        self.sums.jitter_ms += other.sums.jitter_ms;
        self.sample_count += other.sample_count;
        self.samples.extend(other.samples);
    }

    /// Divide the sums by the sample count
    ///
    /// A single-sample bucket keeps its raw values. Dividing by one would give the same
    /// numbers; the skip is kept as deliberate behaviour, and changing it is a regression.
    fn finalize(self) -> Bucket {
        let mut means = self.sums;
        if self.sample_count > 1 {
            let n = self.sample_count as f64;
            means.send_bitrate /= n;
            means.recv_bitrate /= n;
            means.send_pps /= n;
            means.recv_pps /= n;
            means.loss_percent /= n;
            means.jitter_ms /= n;
        }

        Bucket {
            sample_count: self.sample_count,
            target_bitrate: self.target_bitrate,
            payload_size: self.payload_size,
            send_bitrate: means.send_bitrate,
            recv_bitrate: means.recv_bitrate,
            send_pps: means.send_pps,
            recv_pps: means.recv_pps,
            loss_percent: means.loss_percent,
            jitter_ms: means.jitter_ms,
            samples: self.samples,
        }
    }
}

/// Aggregation context over many parsed reports
#[derive(Debug, Default)]
pub struct ResultAggregator {
    buckets: BTreeMap<u64, BTreeMap<u64, Accumulator>>,
    sample_count: usize,
}

impl ResultAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one report under an explicit `(outer, inner)` key
    ///
    /// The bucket's `target_bitrate` and `payload_size` come from the first report added
    /// under that key.
    pub fn add(&mut self, source_name: impl Into<String>, report: ParsedReport, key: (u64, u64)) {
        let (outer, inner) = key;
        let source_name = source_name.into();
        debug!(source = %source_name, outer, inner, "adding sample");

        self.buckets
            .entry(outer)
            .or_default()
            .entry(inner)
            .or_default()
            .add(Sample {
                source_name,
                report,
            });
        self.sample_count += 1;
    }

    /// Fold another partial aggregator into this one
    ///
    /// Samples from `other` are appended after the samples already held here.
    pub fn merge(&mut self, other: ResultAggregator) {
        for (outer, inner_map) in other.buckets {
            let target = self.buckets.entry(outer).or_default();
            for (inner, acc) in inner_map {
                target.entry(inner).or_default().merge(acc);
            }
        }
        self.sample_count += other.sample_count;
    }

    /// Number of reports added so far
    pub fn len(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Produce the averaged result
    ///
    /// Fails with [`ReportError::EmptyInput`] if nothing was added.
    pub fn finalize(self) -> Result<AggregatedResult, ReportError> {
        if self.sample_count == 0 {
            return Err(ReportError::EmptyInput);
        }

        let groups = self
            .buckets
            .into_iter()
            .map(|(outer, inner_map)| {
                let inner_map = inner_map
                    .into_iter()
                    .map(|(inner, acc)| (inner, acc.finalize()))
                    .collect();
                (outer, inner_map)
            })
            .collect();

        Ok(AggregatedResult::new(groups))
    }
}

/// Aggregate reports sequentially with a caller-supplied key function
pub fn aggregate<I, F>(reports: I, key_of: F) -> Result<AggregatedResult, ReportError>
where
    I: IntoIterator<Item = (String, ParsedReport)>,
    F: Fn(&ParsedReport) -> (u64, u64),
{
    let mut aggregator = ResultAggregator::new();
    for (source_name, report) in reports {
        let key = key_of(&report);
        aggregator.add(source_name, report, key);
    }
    aggregator.finalize()
}

/// Aggregate reports keyed by bitrate or payload size
pub fn aggregate_by<I>(reports: I, group_by: GroupBy) -> Result<AggregatedResult, ReportError>
where
    I: IntoIterator<Item = (String, ParsedReport)>,
{
    aggregate(reports, |report| group_by.key(report))
}

/// Aggregate in parallel: partial aggregators per rayon task, merged before finalizing
pub fn aggregate_parallel<F>(
    reports: Vec<(String, ParsedReport)>,
    key_of: F,
) -> Result<AggregatedResult, ReportError>
where
    F: Fn(&ParsedReport) -> (u64, u64) + Sync + Send,
{
    reports
        .into_par_iter()
        .fold(ResultAggregator::new, |mut aggregator, (source_name, report)| {
            let key = key_of(&report);
            aggregator.add(source_name, report, key);
            aggregator
        })
        .reduce(ResultAggregator::new, |mut left, right| {
            left.merge(right);
            left
        })
        .finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report_str;
    use crate::report::parser::tests::{synthetic_report, LOW_RATE_REPORT, SMALL_PAYLOAD_REPORT};
    use crate::stats::packets_per_second;
    use crate::stats::tests::make_report;
    use proptest::prelude::*;

    fn named(reports: Vec<ParsedReport>) -> Vec<(String, ParsedReport)> {
        reports
            .into_iter()
            .enumerate()
            .map(|(i, r)| (format!("run-{}.txt", i), r))
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= expected.abs() * 1e-9 + 1e-9,
            "{} != {}",
            actual,
            expected
        );
    }

    fn assert_buckets_close(a: &Bucket, b: &Bucket) {
        assert_eq!(a.sample_count, b.sample_count);
        assert_eq!(a.target_bitrate, b.target_bitrate);
        assert_eq!(a.payload_size, b.payload_size);
        assert_close(a.send_bitrate, b.send_bitrate);
        assert_close(a.recv_bitrate, b.recv_bitrate);
        assert_close(a.send_pps, b.send_pps);
        assert_close(a.recv_pps, b.recv_pps);
        assert_close(a.loss_percent, b.loss_percent);
        assert_close(a.jitter_ms, b.jitter_ms);
    }

    #[test]
    fn test_aggregate_empty_is_error() {
        let err = aggregate_by(Vec::new(), GroupBy::Bitrate).unwrap_err();
        assert_eq!(err, ReportError::EmptyInput);

        assert_eq!(ResultAggregator::new().finalize().unwrap_err(), ReportError::EmptyInput);
        assert_eq!(
            aggregate_parallel(Vec::new(), |r| GroupBy::Bitrate.key(r)).unwrap_err(),
            ReportError::EmptyInput
        );
    }

    #[test]
    fn test_two_samples_average_to_target() {
        let reports = named(vec![
            make_report(1_000_000, 16, 999_000.0, 998_000.0, 1.0, 0.1),
            make_report(1_000_000, 16, 1_001_000.0, 1_000_000.0, 3.0, 0.3),
        ]);

        let result = aggregate_by(reports, GroupBy::Bitrate).unwrap();
        let bucket = result.get(1_000_000, 16).unwrap();

        assert_eq!(bucket.sample_count, 2);
        assert_eq!(bucket.send_bitrate, 1_000_000.0);
        assert_eq!(bucket.recv_bitrate, 999_000.0);
        assert_close(bucket.loss_percent, 2.0);
        assert_close(bucket.jitter_ms, 0.2);
        assert_close(bucket.send_pps, packets_per_second(1_000_000.0, 16));
        assert_eq!(bucket.samples.len(), 2);
        assert_eq!(bucket.samples[0].source_name, "run-0.txt");
        assert_eq!(bucket.samples[1].source_name, "run-1.txt");
    }

    #[test]
    fn test_single_sample_keeps_raw_values() {
        let report = make_report(10_000_000, 512, 9_876_543.0, 9_000_001.0, 0.7, 0.042);
        let metrics = SampleMetrics::from_report(&report);

        let result = aggregate_by(named(vec![report]), GroupBy::Bitrate).unwrap();
        let bucket = result.get(10_000_000, 512).unwrap();

        assert_eq!(bucket.sample_count, 1);
        assert_eq!(bucket.send_bitrate, metrics.send_bitrate);
        assert_eq!(bucket.recv_bitrate, metrics.recv_bitrate);
        assert_eq!(bucket.send_pps, metrics.send_pps);
        assert_eq!(bucket.recv_pps, metrics.recv_pps);
        assert_eq!(bucket.loss_percent, 0.7);
        assert_eq!(bucket.jitter_ms, 0.042);
    }

    #[test]
    fn test_single_sample_pps_reproduces_ratio() {
        let report = make_report(10_000_000, 512, 9_876_543.0, 9_000_001.0, 0.0, 0.0);
        let result = aggregate_by(named(vec![report]), GroupBy::Bitrate).unwrap();
        let bucket = result.get(10_000_000, 512).unwrap();

        let ratio = bucket.send_pps * 8.0 / 1e6;
        assert_close(ratio, 9_876_543.0 / 512.0);
        let ratio = bucket.recv_pps * 8.0 / 1e6;
        assert_close(ratio, 9_000_001.0 / 512.0);
    }

    #[test]
    fn test_buckets_are_ordered_ascending() {
        let reports = named(vec![
            make_report(40_000_000, 1448, 1.0, 1.0, 0.0, 0.0),
            make_report(1_000_000, 1448, 1.0, 1.0, 0.0, 0.0),
            make_report(10_000_000, 64, 1.0, 1.0, 0.0, 0.0),
            make_report(10_000_000, 16, 1.0, 1.0, 0.0, 0.0),
        ]);

        let result = aggregate_by(reports, GroupBy::Bitrate).unwrap();
        let keys: Vec<(u64, u64)> = result.iter().map(|(o, i, _)| (o, i)).collect();
        assert_eq!(
            keys,
            vec![
                (1_000_000, 1448),
                (10_000_000, 16),
                (10_000_000, 64),
                (40_000_000, 1448)
            ]
        );
        assert_eq!(result.len(), 4);
        assert_eq!(result.total_samples(), 4);
        assert_eq!(result.outer_keys().collect::<Vec<_>>(), vec![1_000_000, 10_000_000, 40_000_000]);
    }

    #[test]
    fn test_group_by_payload_swaps_keys() {
        let reports = named(vec![
            make_report(1_000_000, 16, 1.0, 1.0, 0.0, 0.0),
            make_report(1_000_000, 32, 1.0, 1.0, 0.0, 0.0),
        ]);

        let result = aggregate_by(reports, GroupBy::PayloadSize).unwrap();
        assert!(result.get(16, 1_000_000).is_some());
        assert!(result.get(32, 1_000_000).is_some());
        assert!(result.get(1_000_000, 16).is_none());
        assert_eq!(result.get(32, 1_000_000).unwrap().payload_size, 32);
    }

    #[test]
    fn test_sample_count_matches_reports_per_key() {
        let mut reports = Vec::new();
        for i in 0..5 {
            reports.push(make_report(1_000_000, 16, 1e6 + i as f64, 1e6, 0.0, 0.0));
        }
        for _ in 0..3 {
            reports.push(make_report(2_000_000, 16, 2e6, 2e6, 0.0, 0.0));
        }

        let result = aggregate_by(named(reports), GroupBy::Bitrate).unwrap();
        assert_eq!(result.get(1_000_000, 16).unwrap().sample_count, 5);
        assert_eq!(result.get(2_000_000, 16).unwrap().sample_count, 3);
        assert_eq!(result.total_samples(), 8);
    }

    #[test]
    fn test_custom_key_function() {
        let reports = named(vec![
            make_report(1_000_000, 16, 1.0, 1.0, 0.0, 0.0),
            make_report(2_000_000, 32, 1.0, 1.0, 0.0, 0.0),
        ]);

        let result = aggregate(reports, |_| (0, 0)).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(0, 0).unwrap().sample_count, 2);
    }

    #[test]
    fn test_mixed_bucket_keeps_first_report_parameters() {
        let reports = named(vec![
            make_report(1_000_000, 16, 1.0, 1.0, 0.0, 0.0),
            make_report(2_000_000, 32, 1.0, 1.0, 0.0, 0.0),
            make_report(3_000_000, 64, 1.0, 1.0, 0.0, 0.0),
        ]);

        let bucket = aggregate(reports.clone(), |_| (0, 0)).unwrap().get(0, 0).cloned().unwrap();
        assert_eq!(bucket.target_bitrate, 1_000_000);
        assert_eq!(bucket.payload_size, 16);

        let mut left = ResultAggregator::new();
        let mut right = ResultAggregator::new();
        let mut iter = reports.into_iter();
        let (name, report) = iter.next().unwrap();
        left.add(name, report, (0, 0));
        for (name, report) in iter {
            right.add(name, report, (0, 0));
        }
        left.merge(right);
        let bucket = left.finalize().unwrap().get(0, 0).cloned().unwrap();
        assert_eq!(bucket.target_bitrate, 1_000_000);
        assert_eq!(bucket.payload_size, 16);
        assert_eq!(bucket.sample_count, 3);

        let parallel = aggregate_parallel(
            named(vec![
                make_report(1_000_000, 16, 1.0, 1.0, 0.0, 0.0),
                make_report(2_000_000, 32, 1.0, 1.0, 0.0, 0.0),
            ]),
            |_| (0, 0),
        )
        .unwrap();
        assert_eq!(parallel.get(0, 0).unwrap().target_bitrate, 1_000_000);
    }

    #[test]
    fn test_merge_then_finalize_matches_sequential() {
        let reports = named(vec![
            make_report(1_000_000, 16, 999_000.0, 990_000.0, 1.0, 0.1),
            make_report(1_000_000, 16, 1_001_000.0, 995_000.0, 0.5, 0.2),
            make_report(2_000_000, 16, 2_000_000.0, 1_900_000.0, 5.0, 0.3),
        ]);

        let mut left = ResultAggregator::new();
        let mut right = ResultAggregator::new();
        for (i, (name, report)) in reports.clone().into_iter().enumerate() {
            let key = GroupBy::Bitrate.key(&report);
            if i % 2 == 0 {
                left.add(name, report, key);
            } else {
                right.add(name, report, key);
            }
        }
        left.merge(right);
        assert_eq!(left.len(), 3);

        let merged = left.finalize().unwrap();
        let sequential = aggregate_by(reports, GroupBy::Bitrate).unwrap();
        for (outer, inner, bucket) in sequential.iter() {
            assert_buckets_close(merged.get(outer, inner).unwrap(), bucket);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut reports = Vec::new();
        for i in 0..64u64 {
            let target = 1_000_000 * (1 + i % 4);
            reports.push(make_report(target, 16 << (i % 3), target as f64 - i as f64, target as f64 * 0.9, i as f64 / 10.0, 0.01 * i as f64));
        }
        let reports = named(reports);

        let parallel = aggregate_parallel(reports.clone(), |r| GroupBy::Bitrate.key(r)).unwrap();
        let sequential = aggregate_by(reports, GroupBy::Bitrate).unwrap();

        assert_eq!(parallel.len(), sequential.len());
        for (outer, inner, bucket) in sequential.iter() {
            let other = parallel.get(outer, inner).unwrap();
            assert_buckets_close(other, bucket);
            let names: Vec<_> = other.samples.iter().map(|s| &s.source_name).collect();
            let expected: Vec<_> = bucket.samples.iter().map(|s| &s.source_name).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn test_aggregate_parsed_reports() {
        let reports = vec![
            ("low.txt".to_string(), parse_report_str(LOW_RATE_REPORT, "low.txt").unwrap()),
            ("small.txt".to_string(), parse_report_str(SMALL_PAYLOAD_REPORT, "small.txt").unwrap()),
            (
                "small-2.txt".to_string(),
                parse_report_str(&synthetic_report("1000000", 16, "1002000", "1001000"), "small-2.txt").unwrap(),
            ),
        ];

        let result = aggregate_by(reports, GroupBy::Bitrate).unwrap();
        assert_eq!(result.len(), 2);

        let small = result.get(1_000_000, 16).unwrap();
        assert_eq!(small.sample_count, 2);
        assert_eq!(small.send_bitrate, 1_001_000.0);
        assert_eq!(small.recv_bitrate, 1_000_500.0);

        let low = result.get(940_000_000, 1000).unwrap();
        assert_eq!(low.sample_count, 1);
        assert_eq!(low.jitter_ms, 0.818);
    }

    #[test]
    fn test_without_samples_strips_lists() {
        let reports = named(vec![make_report(1_000_000, 16, 1.0, 1.0, 0.0, 0.0)]);
        let result = aggregate_by(reports, GroupBy::Bitrate).unwrap();
        let stripped = result.without_samples();

        assert!(stripped.get(1_000_000, 16).unwrap().samples.is_empty());
        assert_eq!(stripped.get(1_000_000, 16).unwrap().sample_count, 1);
    }

    proptest! {
        #[test]
        fn prop_aggregation_is_order_independent(
            rates in prop::collection::vec((0u64..3, 1u64..3, 1.0f64..1e9, 0.0f64..100.0), 1..24)
                .prop_flat_map(|rows| {
                    let shuffled = Just(rows.clone()).prop_shuffle();
                    (Just(rows), shuffled)
                })
        ) {
            let build = |rows: &Vec<(u64, u64, f64, f64)>| -> Vec<(String, ParsedReport)> {
                rows.iter()
                    .map(|&(bw, ps, bps, loss)| {
                        let report = make_report((bw + 1) * 1_000_000, ps * 16, bps, bps / 2.0, loss, loss / 100.0);
                        (format!("{}-{}-{}", bw, ps, bps), report)
                    })
                    .collect()
            };

            let (original, shuffled) = rates;
            let a = aggregate_by(build(&original), GroupBy::Bitrate).unwrap();
            let b = aggregate_by(build(&shuffled), GroupBy::Bitrate).unwrap();

            prop_assert_eq!(a.len(), b.len());
            for (outer, inner, bucket) in a.iter() {
                let other = b.get(outer, inner).unwrap();
                prop_assert_eq!(bucket.sample_count, other.sample_count);
                for (x, y) in [
                    (bucket.send_bitrate, other.send_bitrate),
                    (bucket.recv_bitrate, other.recv_bitrate),
                    (bucket.send_pps, other.send_pps),
                    (bucket.loss_percent, other.loss_percent),
                    (bucket.jitter_ms, other.jitter_ms),
                ] {
                    prop_assert!((x - y).abs() <= x.abs().max(y.abs()) * 1e-9 + 1e-12);
                }
            }
        }
    }
}
