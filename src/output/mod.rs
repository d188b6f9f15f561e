//! Output formatting: console text, JSON documents and CSV tables

pub mod csv;
pub mod json;
pub mod text;
