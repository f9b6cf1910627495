//! Best-fit selection: choose the subset of items whose combined size comes
//! closest to a capacity without going over.
//!
//! Three stages, each usable on its own:
//! 1. [`scale`]: quantize sizes by a capacity-dependent divisor and solve the
//!    0/1 knapsack exactly in the coarse space
//! 2. [`repair`]: drop low-value items until the true total fits again
//! 3. [`backfill`]: first-fit leftover items into the remaining slack
//!
//! Items are keyed in a [`BTreeMap`], so reconstruction tie-breaks, repair
//! ties, and backfill order all follow identifier order and results are
//! deterministic. Among equally good subsets, callers should rely on the total
//! rather than on which identifiers were picked.

pub mod backfill;
pub mod repair;
pub mod scale;

#[cfg(test)]
mod test_properties;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::config::SelectionConfig;
use crate::select::scale::ScalePolicy;

/// Item identifier → size in bytes.
pub type ItemSizes = BTreeMap<String, u64>;

/// Sum of sizes, saturating at `u64::MAX`.
#[must_use]
pub fn total_size(items: &ItemSizes) -> u64 {
    items
        .values()
        .fold(0u64, |acc, size| acc.saturating_add(*size))
}

/// How one selection call went. Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// Every item fit, so no optimization ran.
    pub everything_fits: bool,
    /// Quantization divisor; 1 when the problem was solved unscaled.
    pub divisor: u64,
    /// Capacity in scaled units.
    pub scaled_capacity: u64,
    /// Best scaled total the knapsack reached.
    pub scaled_optimum: u64,
    /// Items picked by the knapsack before repair.
    pub reconstructed: usize,
    /// Items dropped to bring the true total under capacity, in order.
    pub removed_by_repair: Vec<String>,
    /// Repair could not make the selection fit and cleared it.
    pub repair_abandoned: bool,
    /// Items added from the leftovers, in order.
    pub added_by_backfill: Vec<String>,
}

/// Outcome of [`Selector::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Chosen items with their true sizes.
    pub items: ItemSizes,
    /// Capacity the selection was made for.
    pub capacity: u64,
    /// Per-stage diagnostics.
    pub report: SelectionReport,
}

impl Selection {
    /// Combined size of the selected items.
    #[must_use]
    pub fn total(&self) -> u64 {
        total_size(&self.items)
    }

    /// Capacity left unused.
    #[must_use]
    pub fn free_space(&self) -> u64 {
        self.capacity.saturating_sub(self.total())
    }

    /// An empty selection means no subset fits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stateless best-fit selector.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    policy: ScalePolicy,
}

impl Selector {
    /// Selector using an explicit scale policy.
    #[must_use]
    pub fn new(policy: ScalePolicy) -> Self {
        Self { policy }
    }

    /// Selector built from the `[selection]` config section.
    #[must_use]
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(ScalePolicy::from_config(config))
    }

    /// Pick the subset of `items` that best fills `capacity`.
    ///
    /// A non-empty result never exceeds `capacity`. An empty result from a
    /// non-empty input means nothing could be made to fit.
    #[must_use]
    pub fn select(&self, items: &ItemSizes, capacity: u64) -> Selection {
        if total_size(items) <= capacity {
            return Selection {
                items: items.clone(),
                capacity,
                report: SelectionReport {
                    everything_fits: true,
                    divisor: 1,
                    scaled_capacity: capacity,
                    ..SelectionReport::default()
                },
            };
        }

        let divisor = self.policy.divisor_for(capacity, items.len());
        let solution = scale::solve_scaled(items, capacity, divisor);
        let reconstructed = solution.selected.len();
        let mut chosen = solution.selected;

        let repaired = repair::repair_overflow(&mut chosen, capacity, divisor);
        let added = backfill::backfill(items, &mut chosen, capacity);

        Selection {
            items: chosen,
            capacity,
            report: SelectionReport {
                everything_fits: false,
                divisor,
                scaled_capacity: solution.scaled_capacity,
                scaled_optimum: solution.scaled_optimum,
                reconstructed,
                removed_by_repair: repaired.removed,
                repair_abandoned: repaired.abandoned,
                added_by_backfill: added,
            },
        }
    }
}

/// Select with the default scale policy and return only the chosen items.
#[must_use]
pub fn select(items: &ItemSizes, capacity: u64) -> ItemSizes {
    Selector::default().select(items, capacity).items
}
