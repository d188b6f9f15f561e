//! iperfstat CLI entry point

use anyhow::{Context, Result};
use iperfstat::config::cli::{Cli, ExecutionMode};
use iperfstat::config::{toml::load_config, validator::validate_config, Config};
use iperfstat::input::{expand_inputs, load_reports, load_values};
use iperfstat::output::csv::write_csv_output;
use iperfstat::output::json::{report_to_json, write_json_output, JsonSummary};
use iperfstat::output::text::{describe_bitrates, print_summary, render_description};
use iperfstat::stats::aggregator::{aggregate_by, aggregate_parallel};
use iperfstat::stats::describe::{filter_range, frequency_bins, linspace, Description};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = load_config(&cli)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.runtime.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    validate_config(&config).context("Configuration validation failed")?;
    debug!(mode = ?cli.mode, "configuration loaded");

    if config.runtime.dry_run {
        print!("{}", config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let paths = expand_inputs(&config.input.paths)?;
    if paths.is_empty() {
        anyhow::bail!("No input files found");
    }
    info!(files = paths.len(), "expanded inputs");

    match cli.mode {
        ExecutionMode::Summary => run_summary(&config, &paths),
        ExecutionMode::Parse => run_parse(&config, &paths),
        ExecutionMode::Describe => run_describe(&config, &paths),
    }
}

/// Aggregate UDP reports and write every requested rendering
fn run_summary(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let reports = load_reports(paths, config.input.parallel, config.input.on_error)?;
    let group_by = config.analysis.group_by;

    let result = if config.input.parallel {
        aggregate_parallel(reports, |report| group_by.key(report))
    } else {
        aggregate_by(reports, group_by)
    }
    .context("Aggregation failed")?;

    print_summary(&result, group_by);

    if let Some(ref path) = config.output.json_output {
        let summary = JsonSummary::new(&result, group_by, config.output.include_samples);
        write_json_output(path, &summary, config.output.pretty)?;
        println!("JSON summary written to {}", path.display());
    }

    if let Some(ref path) = config.output.csv_output {
        write_csv_output(path, &result, group_by)?;
        println!("CSV summary written to {}", path.display());
    }

    Ok(())
}

/// Print each parsed report as JSON
fn run_parse(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let reports = load_reports(paths, config.input.parallel, config.input.on_error)?;

    for (source_name, report) in &reports {
        info!(
            source = %source_name,
            "{}",
            describe_bitrates(report.send_bitrate(), report.recv_bitrate())
        );
        println!("{}", report_to_json(source_name, report)?);
    }

    Ok(())
}

/// Describe per-interval samples and print their frequency bins
fn run_describe(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let log_type = config.analysis.log_type;
    let mut values = load_values(paths, log_type, config.input.parallel, config.input.on_error)?;

    if let Some((lo, hi)) = config.analysis.range {
        values = filter_range(&values, lo, hi);
        debug!(kept = values.len(), lo, hi, "applied range filter");
    }

    let description = Description::from_values(&values)
        .with_context(|| format!("No {} samples found", log_type))?;
    let edges = linspace(description.min, description.max, config.analysis.bins);
    let bins = frequency_bins(&values, &edges);

    print!(
        "{}",
        render_description(log_type.label(), &description, &bins, log_type.scale())
    );

    Ok(())
}
