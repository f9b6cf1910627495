//! Property-based tests for selector invariants.
//!
//! Arbitrary item sets and capacities must always yield a selection that fits,
//! take everything when everything fits, and never lose ground in backfill.

use proptest::prelude::*;

use super::backfill::backfill;
use super::repair::repair_overflow;
use super::scale::{ScalePolicy, solve_scaled};
use super::{ItemSizes, Selector, total_size};

// ──────────────────── strategies ────────────────────

fn arb_items(max_len: usize, max_size: u64) -> impl Strategy<Value = ItemSizes> {
    prop::collection::btree_map("[a-z]{1,6}", 0..=max_size, 0..=max_len)
}

/// Sizes that straddle every default tier boundary.
fn arb_mixed_size() -> impl Strategy<Value = u64> {
    prop_oneof![
        0u64..=1_000,
        1_000u64..=100_000,
        100_000u64..=2_000_000,
        2_000_000u64..=3_000_000_000,
    ]
}

fn arb_mixed_items() -> impl Strategy<Value = ItemSizes> {
    prop::collection::btree_map("[a-z]{1,6}", arb_mixed_size(), 0..=12)
}

fn arb_capacity() -> impl Strategy<Value = u64> {
    prop_oneof![
        0u64..=100_000,
        100_001u64..=1_000_000,
        1_000_001u64..=1_000_000_000,
        1_000_000_001u64..=20_000_000_000,
    ]
}

/// Exhaustive optimum for small inputs.
fn brute_force_best(items: &ItemSizes, capacity: u64) -> u64 {
    let sizes: Vec<u64> = items.values().copied().collect();
    let mut best = 0;
    for mask in 0u32..(1 << sizes.len()) {
        let total: u64 = sizes
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, size)| *size)
            .sum();
        if total <= capacity && total > best {
            best = total;
        }
    }
    best
}

fn is_subset(selection: &ItemSizes, items: &ItemSizes) -> bool {
    selection
        .iter()
        .all(|(name, size)| items.get(name) == Some(size))
}

// ──────────────────── properties ────────────────────

proptest! {
    #[test]
    fn selection_never_exceeds_capacity(items in arb_mixed_items(), capacity in arb_capacity()) {
        let selection = Selector::default().select(&items, capacity);
        prop_assert!(selection.is_empty() || selection.total() <= capacity);
        prop_assert!(is_subset(&selection.items, &items));
    }

    #[test]
    fn everything_fitting_returns_full_input(items in arb_items(10, 10_000), slack in 0u64..1_000) {
        let capacity = total_size(&items) + slack;
        let selection = Selector::default().select(&items, capacity);
        prop_assert_eq!(&selection.items, &items);
        prop_assert!(selection.report.everything_fits);
    }

    #[test]
    fn unscaled_selection_is_optimal(items in arb_items(10, 30_000), capacity in 0u64..=100_000) {
        // Divisor 1 below 100_000: the DP is exact and nothing needs repair.
        let selection = Selector::default().select(&items, capacity);
        prop_assert_eq!(selection.total(), brute_force_best(&items, capacity));
        prop_assert!(selection.report.removed_by_repair.is_empty());
    }

    #[test]
    fn backfill_never_loses_ground(items in arb_mixed_items(), capacity in arb_capacity()) {
        let divisor = ScalePolicy::default().divisor_for(capacity, items.len());
        let mut chosen = solve_scaled(&items, capacity, divisor).selected;
        repair_overflow(&mut chosen, capacity, divisor);
        let repaired_total = total_size(&chosen);
        prop_assert!(repaired_total <= capacity);

        backfill(&items, &mut chosen, capacity);
        let filled_total = total_size(&chosen);
        prop_assert!(filled_total >= repaired_total);
        prop_assert!(filled_total <= capacity);
    }

    #[test]
    fn any_single_fitting_item_makes_selection_non_empty(
        items in arb_mixed_items(),
        capacity in arb_capacity(),
    ) {
        let selection = Selector::default().select(&items, capacity);
        let any_positive_fits = items.values().any(|size| *size > 0 && *size <= capacity);
        if any_positive_fits {
            prop_assert!(selection.total() > 0);
        }
    }

    #[test]
    fn selection_is_deterministic(items in arb_mixed_items(), capacity in arb_capacity()) {
        let first = Selector::default().select(&items, capacity);
        let second = Selector::default().select(&items, capacity);
        prop_assert_eq!(first, second);
    }
}
