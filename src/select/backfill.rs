//! Greedy backfill: pack leftover capacity with whatever still fits.

#![allow(missing_docs)]

use crate::select::{ItemSizes, total_size};

/// Add unselected items from `items`, first-fit in map order, until a full
/// scan adds nothing. Returns the names added, in order.
///
/// No optimality guarantee; this only recovers slack left by scaling and
/// repair. A selection already at or over `capacity` is left alone.
pub fn backfill(items: &ItemSizes, selection: &mut ItemSizes, capacity: u64) -> Vec<String> {
    let mut added = Vec::new();

    loop {
        let mut remaining = capacity.saturating_sub(total_size(selection));
        if remaining == 0 {
            break;
        }

        let before = added.len();
        for (name, &size) in items {
            if remaining == 0 {
                break;
            }
            if size <= remaining && !selection.contains_key(name) {
                selection.insert(name.clone(), size);
                added.push(name.clone());
                remaining -= size;
            }
        }

        if added.len() == before {
            break;
        }
    }

    added
}
