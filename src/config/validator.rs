//! Configuration validation

use super::*;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_input(&config.input)?;
    validate_analysis(&config.analysis)?;
    validate_output(&config.output)?;
    validate_runtime(&config.runtime)?;

    Ok(())
}

/// Validate input configuration
pub fn validate_input(input: &InputConfig) -> Result<()> {
    if input.paths.is_empty() {
        anyhow::bail!("At least one input file or pattern must be specified");
    }

    if let Some(index) = input.paths.iter().position(|p| p.trim().is_empty()) {
        anyhow::bail!("Input path {} is empty", index);
    }

    Ok(())
}

/// Validate analysis configuration
pub fn validate_analysis(analysis: &AnalysisConfig) -> Result<()> {
    if analysis.bins < 2 {
        anyhow::bail!("bins must be at least 2, got {}", analysis.bins);
    }

    if let Some((lo, hi)) = analysis.range {
        if !(lo.is_finite() && hi.is_finite()) {
            anyhow::bail!("range bounds must be finite, got [{}, {}]", lo, hi);
        }
        if lo > hi {
            anyhow::bail!("range lower bound {} exceeds upper bound {}", lo, hi);
        }
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if let (Some(json), Some(csv)) = (&output.json_output, &output.csv_output) {
        if json == csv {
            anyhow::bail!("json_output and csv_output must differ, both are {}", json.display());
        }
    }

    Ok(())
}

/// Validate runtime configuration
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if let Err(e) = EnvFilter::try_new(&runtime.log_level) {
        anyhow::bail!("Invalid log_level {:?}: {}", runtime.log_level, e);
    }

    Ok(())
}
