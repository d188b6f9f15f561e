//! Error types for report parsing and aggregation
//!
//! Every variant is terminal for the report or call that produced it. The parser never
//! hands back a partially filled record, and the aggregator refuses to produce an empty
//! result.

use thiserror::Error;

/// Errors raised by the parsing and aggregation core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    /// A numeric token was neither a bare decimal nor a decimal with one k/m/g suffix
    #[error("malformed number: {token:?}")]
    MalformedNumber { token: String },

    /// The summary anchor row or one of the two summary rows is missing or malformed
    #[error("invalid structure in {source_name}: {reason}")]
    InvalidStructure { source_name: String, reason: String },

    /// Line 0 is not a recorded `iperf3 -u` invocation
    #[error("invalid command line in {source_name}")]
    InvalidInvocation { source_name: String },

    /// A summary row carries the wrong direction label
    #[error("invalid role {found:?} in {source_name}, expected {expected:?}")]
    InvalidRole {
        source_name: String,
        expected: &'static str,
        found: String,
    },

    /// Aggregation was asked to summarize zero reports
    #[error("the target report list is empty")]
    EmptyInput,
}

impl ReportError {
    pub(crate) fn structure(source_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}
