//! Coarsen-and-solve stage: quantize sizes by a capacity-dependent divisor and
//! run an exact 0/1 knapsack over the scaled problem.

#![allow(missing_docs)]

use crate::core::config::{ScaleTier, SelectionConfig};
use crate::select::ItemSizes;

/// Chooses the divisor used to quantize a selection problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalePolicy {
    tiers: Vec<ScaleTier>,
    fallback_divisor: u64,
    max_table_cells: u64,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl ScalePolicy {
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self {
            tiers: config.tiers.clone(),
            fallback_divisor: config.fallback_divisor.max(1),
            max_table_cells: config.max_table_cells.max(1),
        }
    }

    /// Divisor from the tier ladder alone.
    #[must_use]
    pub fn tier_divisor(&self, capacity: u64) -> u64 {
        self.tiers
            .iter()
            .find(|tier| capacity <= tier.max_capacity)
            .map_or(self.fallback_divisor, |tier| tier.divisor)
            .max(1)
    }

    /// Divisor for `capacity` with `item_count` rows in the DP table.
    ///
    /// Starts from the tier ladder and multiplies by 10 while the keep table
    /// would exceed `max_table_cells`.
    #[must_use]
    pub fn divisor_for(&self, capacity: u64, item_count: usize) -> u64 {
        let rows = (item_count as u64).saturating_add(1);
        let mut divisor = self.tier_divisor(capacity);
        while divisor < u64::MAX
            && (capacity / divisor)
                .saturating_add(1)
                .saturating_mul(rows)
                > self.max_table_cells
        {
            divisor = divisor.saturating_mul(10);
        }
        divisor
    }
}

/// Size of an item in the quantized problem.
///
/// A positive size never scales to zero when quantizing; otherwise the DP
/// could admit any number of "free" items.
#[must_use]
pub fn scaled_size(size: u64, divisor: u64) -> u64 {
    let scaled = size / divisor;
    if divisor > 1 && size > 0 && scaled == 0 {
        1
    } else {
        scaled
    }
}

/// One bit per DP cell recording whether the row's item was taken there.
struct KeepTable {
    words: Vec<u64>,
}

impl KeepTable {
    fn new(cells: usize) -> Self {
        Self {
            words: vec![0; cells.div_ceil(64)],
        }
    }

    fn set(&mut self, cell: usize) {
        self.words[cell / 64] |= 1u64 << (cell % 64);
    }

    fn get(&self, cell: usize) -> bool {
        self.words[cell / 64] & (1u64 << (cell % 64)) != 0
    }
}

/// Result of the scaled knapsack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledSolution {
    pub selected: ItemSizes,
    pub divisor: u64,
    pub scaled_capacity: u64,
    /// Best scaled total the DP reached.
    pub scaled_optimum: u64,
}

/// Solve the quantized 0/1 knapsack and reconstruct the chosen items with
/// their true sizes.
///
/// The reconstructed set never exceeds the scaled capacity, but its true total
/// may exceed `capacity`; the repair stage handles that.
#[must_use]
pub fn solve_scaled(items: &ItemSizes, capacity: u64, divisor: u64) -> ScaledSolution {
    let divisor = divisor.max(1);
    let scaled_capacity = capacity / divisor;

    let entries: Vec<(&String, u64, u64)> = items
        .iter()
        .map(|(name, &size)| (name, size, scaled_size(size, divisor)))
        .collect();

    // Columns beyond the scaled sum of every item repeat the last column.
    let scaled_sum = entries
        .iter()
        .fold(0u64, |acc, (_, _, scaled)| acc.saturating_add(*scaled));
    let width = usize::try_from(scaled_capacity.min(scaled_sum)).unwrap_or(usize::MAX - 1);
    let stride = width + 1;

    let mut best = vec![0u64; stride];
    let mut keep = KeepTable::new((entries.len() + 1) * stride);

    for (row, (_, _, scaled)) in entries.iter().enumerate() {
        let Ok(weight) = usize::try_from(*scaled) else {
            continue;
        };
        if weight == 0 || weight > width {
            continue;
        }
        let keep_row = (row + 1) * stride;
        for column in (weight..=width).rev() {
            let taken = best[column - weight] + *scaled;
            if taken > best[column] {
                best[column] = taken;
                keep.set(keep_row + column);
            }
        }
    }

    let mut selected = ItemSizes::new();
    let mut column = width;
    for row in (1..=entries.len()).rev() {
        if column == 0 {
            break;
        }
        if keep.get(row * stride + column) {
            let (name, size, scaled) = entries[row - 1];
            selected.insert(name.clone(), size);
            // Only set when the weight fit this column.
            column -= usize::try_from(scaled).unwrap_or(column);
        }
    }

    ScaledSolution {
        selected,
        divisor,
        scaled_capacity,
        scaled_optimum: best[width],
    }
}
