//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::parse_range;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Render a configuration as TOML
pub fn to_toml_string(config: &Config) -> Result<String> {
    ::toml::to_string(config).context("Failed to serialize configuration")
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
///
/// Input paths given on the command line replace the configured list.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Input
    if !cli.inputs.is_empty() {
        config.input.paths = cli.inputs.clone();
    }
    if cli.no_parallel {
        config.input.parallel = false;
    }
    if let Some(on_error) = cli.on_error {
        config.input.on_error = on_error.into();
    }

    // Analysis
    if let Some(group_by) = cli.group_by {
        config.analysis.group_by = group_by.into();
    }
    if let Some(log_type) = cli.log_type {
        config.analysis.log_type = log_type.into();
    }
    if let Some(bins) = cli.bins {
        config.analysis.bins = bins;
    }
    if let Some(ref range) = cli.range {
        config.analysis.range = Some(parse_range(range).context("Invalid --range")?);
    }

    // Output
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if let Some(ref path) = cli.csv_output {
        config.output.csv_output = Some(path.clone());
    }
    if cli.include_samples {
        config.output.include_samples = true;
    }
    if cli.compact_json {
        config.output.pretty = false;
    }

    // Runtime
    if let Some(ref level) = cli.log_level {
        config.runtime.log_level = level.clone();
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    Ok(config)
}

/// Load the configuration for a CLI invocation: the TOML file if given, merged with the CLI
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, config)
}
