//! Rule construction errors.

use intercept_core::InterceptError;
use thiserror::Error;

/// Errors raised while building a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A wildcard pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// An assembly name could not be parsed.
    #[error("{0}")]
    InvalidAssembly(#[from] InterceptError),
}

/// Result type for rule construction.
pub type Result<T> = std::result::Result<T, RuleError>;
