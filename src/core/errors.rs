//! FF-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FitError>;

/// Top-level error type for folderfit.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("[FF-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FF-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FF-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FF-1101] invalid size argument {input:?}: {reason}")]
    InvalidCapacity { input: String, reason: String },

    #[error("[FF-1102] no sources given")]
    NoSources,

    #[error("[FF-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FF-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FitError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FF-1001",
            Self::MissingConfig { .. } => "FF-1002",
            Self::ConfigParse { .. } => "FF-1003",
            Self::InvalidCapacity { .. } => "FF-1101",
            Self::NoSources => "FF-1102",
            Self::Serialization { .. } => "FF-2101",
            Self::Io { .. } => "FF-3002",
        }
    }

    /// Whether the failure came from what the user typed rather than the
    /// environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidCapacity { .. } | Self::NoSources)
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for capacity parse failures.
    #[must_use]
    pub fn invalid_capacity(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCapacity {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FitError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FitError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
