//! Error types surfaced by configuration loading and world generation.

use std::io;

use thiserror::Error;

/// Failure while loading or validating a [`WorldConfig`](crate::WorldConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

/// Failure of a whole generation run.
///
/// Local search exhaustion never shows up here; every such case has its own fallback.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("grid {width}x{height} is smaller than the {min}x{min} minimum")]
    GridTooSmall { width: usize, height: usize, min: usize },

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
