//! Core types: errors, configuration, byte units.

pub mod config;
pub mod errors;
pub mod units;
