//! Size sources: turn command-line sources into sized selection items.

pub mod sizer;
