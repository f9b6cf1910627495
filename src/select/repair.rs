//! Overflow repair: undo the overshoot that quantization can introduce.

#![allow(missing_docs)]

use std::cmp::Ordering;

use crate::select::{ItemSizes, total_size};

/// What the repair stage did to a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Items dropped, in removal order.
    pub removed: Vec<String>,
    /// The selection was reset to empty because nothing could be removed.
    pub abandoned: bool,
}

/// Scaled size used as the denominator of the value ratio.
#[must_use]
pub fn effective_scaled_size(size: u64, divisor: u64) -> u64 {
    (size / divisor.max(1)).max(1)
}

/// Order two items by true size per unit of scaled capacity consumed.
///
/// Cross-multiplies in `u128`, so equal ratios compare equal exactly.
#[must_use]
pub fn compare_value_ratio(left: u64, right: u64, divisor: u64) -> Ordering {
    let left_scaled = u128::from(effective_scaled_size(left, divisor));
    let right_scaled = u128::from(effective_scaled_size(right, divisor));
    (u128::from(left) * right_scaled).cmp(&(u128::from(right) * left_scaled))
}

/// Drop items until the true total fits `capacity`.
///
/// Each round removes the item with the lowest value ratio; ties go to the
/// first such item in map order.
pub fn repair_overflow(selection: &mut ItemSizes, capacity: u64, divisor: u64) -> RepairOutcome {
    let mut outcome = RepairOutcome::default();

    while total_size(selection) > capacity {
        let victim = selection
            .iter()
            .reduce(|best, candidate| {
                if compare_value_ratio(*candidate.1, *best.1, divisor) == Ordering::Less {
                    candidate
                } else {
                    best
                }
            })
            .map(|(name, _)| name.clone());

        let Some(name) = victim else {
            selection.clear();
            outcome.abandoned = true;
            break;
        };
        selection.remove(&name);
        outcome.removed.push(name);
    }

    outcome
}
