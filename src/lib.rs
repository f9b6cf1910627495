#![forbid(unsafe_code)]

//! folderfit: pick the files and folders that best fill a fixed capacity.
//!
//! Given named items with byte sizes and a target capacity (a DVD, a USB
//! stick, an archive volume), folderfit chooses the subset whose combined size
//! comes as close to the capacity as possible without exceeding it.
//!
//! Pipeline:
//! 1. **Size sources**: sum each file or folder recursively ([`scanner`])
//! 2. **Select**: quantized knapsack, overflow repair, greedy backfill ([`select`])
//! 3. **Report**: human or JSON output from the `folderfit` binary
//!
//! # Library usage
//!
//! ```rust
//! use folderfit::prelude::*;
//!
//! let items: ItemSizes = [("a".to_string(), 1_024), ("b".to_string(), 4_048), ("c".to_string(), 2_048)]
//!     .into_iter()
//!     .collect();
//! let chosen = select(&items, 5_072);
//! assert_eq!(total_size(&chosen), 5_072);
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod scanner;
pub mod select;
