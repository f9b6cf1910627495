//! Recursive size summation for selection sources.
//!
//! Every source named on the command line becomes one item: a file counts its
//! length, a directory counts the sum of everything beneath it. Unreadable
//! entries count as zero; sizing never fails, so a bad path and an empty one
//! look the same to the selector.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::ScannerConfig;
use crate::select::ItemSizes;

/// Literal source argument that expands to the current directory's entries.
pub const WILDCARD_SOURCE: &str = "*";

/// Sizer configuration derived from `ScannerConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizerConfig {
    pub follow_symlinks: bool,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

impl From<&ScannerConfig> for SizerConfig {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
        }
    }
}

/// Stateless recursive sizer.
///
/// Each call starts from scratch; nothing is cached between sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySizer {
    config: SizerConfig,
}

impl DirectorySizer {
    pub fn new(config: SizerConfig) -> Self {
        Self { config }
    }

    /// Total bytes under `path`, or 0 if it cannot be read.
    ///
    /// The path itself is always resolved through symlinks; `follow_symlinks`
    /// governs links found while descending.
    pub fn size_of(&self, path: &Path) -> u64 {
        let Ok(meta) = fs::metadata(path) else {
            return 0;
        };
        let mut stack = Vec::new();
        self.size_with_meta(path, &meta, &mut stack)
    }

    /// Size every source, keyed by the source string as given.
    pub fn measure_sources(&self, sources: &[String]) -> ItemSizes {
        sources
            .iter()
            .map(|source| (source.clone(), self.size_of(Path::new(source))))
            .collect()
    }

    fn size_with_meta(&self, path: &Path, meta: &fs::Metadata, stack: &mut Vec<PathBuf>) -> u64 {
        if !meta.is_dir() {
            return meta.len();
        }

        // Symlinked directories can loop back onto the descent path.
        let key = if self.config.follow_symlinks {
            let Ok(canonical) = fs::canonicalize(path) else {
                return 0;
            };
            if stack.contains(&canonical) {
                return 0;
            }
            Some(canonical)
        } else {
            None
        };

        let Ok(entries) = fs::read_dir(path) else {
            return 0;
        };

        if let Some(key) = &key {
            stack.push(key.clone());
        }
        let mut total = 0u64;
        for entry in entries.flatten() {
            let child = entry.path();
            let Ok(child_meta) = metadata_for_path(&child, self.config.follow_symlinks) else {
                continue;
            };
            total = total.saturating_add(self.size_with_meta(&child, &child_meta, stack));
        }
        if key.is_some() {
            stack.pop();
        }
        total
    }
}

/// Size of `path` with default settings.
pub fn size_of(path: &Path) -> u64 {
    DirectorySizer::default().size_of(path)
}

/// Replace each `*` argument with the entries of the current directory.
pub fn expand_sources(args: &[String]) -> Vec<String> {
    expand_sources_in(args, Path::new("."))
}

/// [`expand_sources`] relative to `dir` instead of the working directory.
///
/// Expanded names are relative to `dir` (no `./` prefix), sorted. An
/// unreadable `dir` expands to nothing.
pub fn expand_sources_in(args: &[String], dir: &Path) -> Vec<String> {
    let mut sources = Vec::with_capacity(args.len());
    for arg in args {
        if arg == WILDCARD_SOURCE {
            sources.extend(list_entries(dir));
        } else {
            sources.push(arg.clone());
        }
    }
    sources
}

fn list_entries(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn metadata_for_path(path: &Path, follow_symlinks: bool) -> std::io::Result<fs::Metadata> {
    if follow_symlinks {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    }
}
