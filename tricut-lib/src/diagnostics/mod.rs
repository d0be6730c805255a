//! Diagnostics helpers.

pub mod bench;
