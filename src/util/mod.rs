//! Shared helpers: number normalization and display formatting

pub mod format;
pub mod number;
