//! Settings error types.

use intercept_rules::RuleError;
use thiserror::Error;

/// Errors that can occur when loading settings or building policies from them.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
    /// A declared policy rule could not be built.
    #[error("invalid rule in policy '{policy}': {source}")]
    Rule {
        /// Policy declaring the rule.
        policy: String,
        /// Underlying rule error.
        #[source]
        source: RuleError,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
