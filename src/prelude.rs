//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use folderfit::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, ScaleTier, SelectionConfig};
pub use crate::core::errors::{FitError, Result};
pub use crate::core::units::{format_size, parse_capacity};

// Scanner
pub use crate::scanner::sizer::{DirectorySizer, SizerConfig, expand_sources, size_of};

// Select
pub use crate::select::scale::ScalePolicy;
pub use crate::select::{
    ItemSizes, Selection, SelectionReport, Selector, select, total_size,
};

// Logger
pub use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
