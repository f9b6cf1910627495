//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FitError, Result};

/// Full folderfit configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub selection: SelectionConfig,
    pub scanner: ScannerConfig,
    pub paths: PathsConfig,
}

/// One rung of the capacity → divisor ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScaleTier {
    /// Inclusive upper bound on the capacity this tier applies to.
    pub max_capacity: u64,
    /// Divisor applied to capacity and item sizes before the DP.
    pub divisor: u64,
}

/// Quantization knobs for the selector.
///
/// A larger divisor shrinks the DP table but rounds sizes more coarsely, which
/// leaves more overshoot for the repair stage to undo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Ascending tiers; the first tier whose `max_capacity` covers the target wins.
    pub tiers: Vec<ScaleTier>,
    /// Divisor for capacities above every tier.
    pub fallback_divisor: u64,
    /// Upper bound on keep-table cells, `(items + 1) * (scaled capacity + 1)`;
    /// the divisor is multiplied by 10 until the table fits.
    pub max_table_cells: u64,
}

/// Size source behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Descend into directories reached through symlinks.
    pub follow_symlinks: bool,
}

/// Filesystem paths used by folderfit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Activity log; disabled when unset.
    pub jsonl_log: Option<PathBuf>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                ScaleTier {
                    max_capacity: 100_000,
                    divisor: 1,
                },
                ScaleTier {
                    max_capacity: 1_000_000,
                    divisor: 100,
                },
                ScaleTier {
                    max_capacity: 1_000_000_000,
                    divisor: 1_000,
                },
            ],
            fallback_divisor: 1_000_000,
            max_table_cells: 1 << 30,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_root = env::var_os("XDG_CONFIG_HOME")
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| {
                eprintln!("[FF-CONFIG] WARNING: HOME not set, falling back to /tmp for config");
                PathBuf::from("/tmp")
            });
        Self {
            config_file: config_root.join("folderfit").join("config.toml"),
            jsonl_log: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FitError::io(&path_buf, source))?;
            Self::from_toml_str(&raw)?
        } else if is_explicit_path {
            return Err(FitError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without touching the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("FOLDERFIT_FALLBACK_DIVISOR") {
            self.selection.fallback_divisor = parse_env_u64("FOLDERFIT_FALLBACK_DIVISOR", &raw)?;
        }

        if let Some(raw) = lookup("FOLDERFIT_MAX_TABLE_CELLS") {
            self.selection.max_table_cells =
                parse_env_u64("FOLDERFIT_MAX_TABLE_CELLS", &raw)?;
        }

        if let Some(raw) = lookup("FOLDERFIT_FOLLOW_SYMLINKS") {
            self.scanner.follow_symlinks = parse_env_bool("FOLDERFIT_FOLLOW_SYMLINKS", &raw)?;
        }

        if let Some(raw) = lookup("FOLDERFIT_JSONL_LOG") {
            self.paths.jsonl_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let selection = &self.selection;

        if selection.max_table_cells == 0 {
            return Err(FitError::InvalidConfig {
                details: "selection.max_table_cells must be >= 1".to_string(),
            });
        }

        if selection.fallback_divisor == 0 {
            return Err(FitError::InvalidConfig {
                details: "selection.fallback_divisor must be >= 1".to_string(),
            });
        }

        let mut previous: Option<&ScaleTier> = None;
        for (index, tier) in selection.tiers.iter().enumerate() {
            if tier.divisor == 0 {
                return Err(FitError::InvalidConfig {
                    details: format!("selection.tiers[{index}].divisor must be >= 1"),
                });
            }
            if let Some(prev) = previous {
                if tier.max_capacity <= prev.max_capacity {
                    return Err(FitError::InvalidConfig {
                        details: format!(
                            "selection.tiers[{index}].max_capacity ({}) must be greater than the previous tier ({})",
                            tier.max_capacity, prev.max_capacity
                        ),
                    });
                }
                if tier.divisor < prev.divisor {
                    return Err(FitError::InvalidConfig {
                        details: format!(
                            "selection.tiers[{index}].divisor ({}) must not be smaller than the previous tier ({})",
                            tier.divisor, prev.divisor
                        ),
                    });
                }
            }
            previous = Some(tier);
        }

        if let Some(last) = previous
            && selection.fallback_divisor < last.divisor
        {
            return Err(FitError::InvalidConfig {
                details: format!(
                    "selection.fallback_divisor ({}) must not be smaller than the last tier divisor ({})",
                    selection.fallback_divisor, last.divisor
                ),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| FitError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| FitError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
