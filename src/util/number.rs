//! Unit-suffixed number normalization
//!
//! iperf3 prints transfer sizes and bitrates as a decimal followed by an optional SI
//! magnitude (`1.19 MBytes`, `940m` on the command line). [`normalize`] turns such a
//! token into a [`Number`] while keeping track of whether the text was written as an
//! integer or as a decimal.
//!
//! # Rounding
//!
//! An integer token with a suffix is scaled in `f64` and rounded with [`f64::round`],
//! which rounds half away from zero. Integer inputs only produce fractional products
//! once the result exceeds 2^53, so below that range the rounding is exact.
//!
//! # Example
//!
//! ```
//! use iperfstat::util::number::{normalize, Number};
//!
//! assert_eq!(normalize("10m").unwrap(), Number::Int(10_000_000));
//! assert_eq!(normalize("2.5M").unwrap(), Number::Float(2_500_000.0));
//! assert!(normalize("bad").is_err());
//! ```

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed numeral that remembers its integer or floating-point intent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Value as `f64` for arithmetic
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    /// Value as `u64` when it is a non-negative integer
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::Int(n) => u64::try_from(n).ok(),
            Number::Float(_) => None,
        }
    }

    /// Whether the token was written without a decimal point
    pub fn is_int(self) -> bool {
        matches!(self, Number::Int(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

/// Scale factor for a magnitude suffix
fn unit_scale(unit: char) -> Option<f64> {
    match unit {
        'k' | 'K' => Some(1e3),
        'm' | 'M' => Some(1e6),
        'g' | 'G' => Some(1e9),
        _ => None,
    }
}

/// Check that `body` is ASCII digits with at most one decimal point
fn is_decimal(body: &str) -> bool {
    let mut digits = 0usize;
    let mut points = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

/// Normalize a numeral with an optional k/m/g suffix
///
/// Returns [`ReportError::MalformedNumber`] for anything that is not a bare decimal or a
/// decimal immediately followed by exactly one of `k K m M g G`.
pub fn normalize(token: &str) -> Result<Number, ReportError> {
    let malformed = || ReportError::MalformedNumber {
        token: token.to_string(),
    };

    let (body, scale) = match token.chars().last() {
        Some(last) => match unit_scale(last) {
            Some(scale) => (&token[..token.len() - last.len_utf8()], Some(scale)),
            None => (token, None),
        },
        None => return Err(malformed()),
    };

    if !is_decimal(body) {
        return Err(malformed());
    }

    if body.contains('.') {
        let value: f64 = body.parse().map_err(|_| malformed())?;
        Ok(Number::Float(value * scale.unwrap_or(1.0)))
    } else {
        let value: i64 = body.parse().map_err(|_| malformed())?;
        match scale {
            None => Ok(Number::Int(value)),
            Some(scale) => {
                let scaled = (value as f64 * scale).round();
                if scaled >= i64::MAX as f64 {
                    return Err(malformed());
                }
                Ok(Number::Int(scaled as i64))
            }
        }
    }
}
