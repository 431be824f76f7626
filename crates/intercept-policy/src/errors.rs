//! Policy errors.

use intercept_core::InterceptError;
use intercept_rules::RuleError;
use thiserror::Error;

/// Errors raised while evaluating policies or resolving their handlers.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No registration exists for a handler reference.
    #[error("no interceptor registered for type '{type_name}'{}", name.as_ref().map(|n| format!(" named '{n}'")).unwrap_or_default())]
    Unresolved {
        /// Referenced type name.
        type_name: String,
        /// Referenced registration name.
        name: Option<String>,
    },

    /// A registered factory refused to build the handler.
    #[error("interceptor factory for '{type_name}' failed: {message}")]
    Factory {
        /// Referenced type name.
        type_name: String,
        /// Factory-supplied reason.
        message: String,
    },

    /// A rule could not be built.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Invalid configuration.
    #[error(transparent)]
    Intercept(#[from] InterceptError),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_display_includes_name() {
        let err = PolicyError::Unresolved {
            type_name: "Audit".into(),
            name: Some("strict".into()),
        };
        assert_eq!(
            err.to_string(),
            "no interceptor registered for type 'Audit' named 'strict'"
        );
        let err = PolicyError::Unresolved {
            type_name: "Audit".into(),
            name: None,
        };
        assert_eq!(err.to_string(), "no interceptor registered for type 'Audit'");
    }
}
