//! Byte-size expressions: parsing user-entered capacities and formatting sizes
//! for display.
//!
//! Units are binary multiples (1 KB = 1024 B) throughout.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::core::errors::{FitError, Result};

/// One kibibyte.
pub const KIB: u64 = 1024;
/// One mebibyte.
pub const MIB: u64 = 1024 * KIB;
/// One gibibyte.
pub const GIB: u64 = 1024 * MIB;

// Longest suffix first so "GB" is not read as "B".
const SUFFIXES: [(&str, u64); 4] = [("GB", GIB), ("MB", MIB), ("KB", KIB), ("B", 1)];

/// Parse a capacity expression such as `4700000000`, `512KB`, `4.7GB` or
/// `"4,7 GB"` into a byte count.
///
/// Fractional byte counts are truncated. A result of zero is rejected: a zero
/// capacity means the argument was missing or meaningless.
pub fn parse_capacity(expr: &str) -> Result<u64> {
    let normalized = expr.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(FitError::invalid_capacity(expr, "empty size"));
    }

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            normalized
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), *multiplier))
        })
        .unwrap_or((normalized.as_str(), 1));
    let number = number.replace(',', ".");
    if number.is_empty() {
        return Err(FitError::invalid_capacity(expr, "missing number"));
    }

    let bytes = if let Ok(whole) = number.parse::<u64>() {
        whole
            .checked_mul(multiplier)
            .ok_or_else(|| FitError::invalid_capacity(expr, "size too large"))?
    } else {
        let value = number
            .parse::<f64>()
            .map_err(|error| FitError::invalid_capacity(expr, error.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(FitError::invalid_capacity(
                expr,
                "size must be a finite, non-negative number",
            ));
        }
        let scaled = value * multiplier as f64;
        if scaled >= u64::MAX as f64 {
            return Err(FitError::invalid_capacity(expr, "size too large"));
        }
        scaled as u64
    };

    if bytes == 0 {
        return Err(FitError::invalid_capacity(
            expr,
            "size must be greater than zero",
        ));
    }
    Ok(bytes)
}

/// Render a byte count for humans: exact bytes, whole KB, then MB/GB with two
/// decimals.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} bytes")
    } else if bytes < MIB {
        format!("{} KB", bytes / KIB)
    } else if bytes < GIB {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    }
}
