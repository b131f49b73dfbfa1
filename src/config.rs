//! `rowmerge.toml` configuration.
//!
//! Holds defaults for the command-line tool: group-id separators, cleaning
//! options and the recursion depth of recursive merges. Command-line flags
//! override whatever the file says.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::group::GroupIdOptions;
use crate::merge::CleanOptions;
use crate::model::Key;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "rowmerge.toml";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Group-id rendering.
    #[serde(default)]
    pub group_id: GroupIdOptions,

    /// Bucket cleaning.
    #[serde(default)]
    pub clean: CleanConfig,

    /// Recursive merge settings.
    #[serde(default)]
    pub merge: MergeConfig,
}

/// Cleaning defaults for `rowmerge buckets`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanConfig {
    /// Collapse buckets holding a single distinct value.
    #[serde(default)]
    pub dedupe: bool,

    /// Columns the cleaners leave alone.
    #[serde(default)]
    pub excluded_columns: Vec<Key>,
}

impl CleanConfig {
    /// The cleaning options this section describes.
    #[must_use]
    pub fn options(&self) -> CleanOptions {
        CleanOptions {
            excluded_columns: self.excluded_columns.clone(),
        }
    }
}

/// Defaults for `rowmerge recursive`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Recursion bound; absent means unbounded.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - Invalid TOML or unknown fields yield a [`ConfigError`] with the
    ///   offending line.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
