//! Error types for building an equivalence registry

use rcmp_core::PathError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a registry, before any traversal
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field path is malformed
    #[error("invalid field path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    /// A regex does not compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Two rules disagree on how to treat the same path or type
    #[error("conflicting rules for '{target}': {reason}")]
    ConflictingRules { target: String, reason: String },

    /// A settings document holds a key that is not a known setting
    #[error("unknown setting '{key}' in {origin}")]
    UnknownSetting { origin: String, key: String },

    /// Failed to read a settings file
    #[error("failed to read settings file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML settings
    #[error("failed to parse settings from {origin}: {source}")]
    ParseYaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}
