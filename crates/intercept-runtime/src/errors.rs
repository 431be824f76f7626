//! Runtime error types.

use intercept_core::InterceptError;
use intercept_policy::PolicyError;
use intercept_settings::SettingsError;

/// Errors raised while building proxies and pipelines.
///
/// Failures of the intercepted code are never reported here; they travel in
/// the [`CallResult`](intercept_core::CallResult) of the call.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Invalid metadata, identity, or call arguments.
    #[error(transparent)]
    Intercept(#[from] InterceptError),

    /// A policy or handler reference could not be evaluated.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Settings could not be turned into policies.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The proxy strategy cannot handle the requested type.
    #[error("cannot intercept '{type_name}': {reason}")]
    CannotIntercept {
        /// Full name of the rejected type.
        type_name: String,
        /// Why the strategy rejected it.
        reason: String,
    },
}

impl RuntimeError {
    /// Error category string for logs.
    pub fn category(&self) -> &str {
        match self {
            Self::Intercept(_) => "intercept",
            Self::Policy(_) => "policy",
            Self::Settings(_) => "settings",
            Self::CannotIntercept { .. } => "cannot_intercept",
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_intercept_display() {
        let err = RuntimeError::CannotIntercept {
            type_name: "Bank.Vault".into(),
            reason: "type is sealed".into(),
        };
        assert_eq!(err.to_string(), "cannot intercept 'Bank.Vault': type is sealed");
        assert_eq!(err.category(), "cannot_intercept");
    }

    #[test]
    fn wraps_lower_layers_transparently() {
        let err: RuntimeError = InterceptError::NotAnInterface {
            type_name: "Bank.Account".into(),
        }
        .into();
        assert_eq!(err.to_string(), "type 'Bank.Account' is not an interface");
        assert_eq!(err.category(), "intercept");

        let err: RuntimeError = PolicyError::Unresolved {
            type_name: "Audit".into(),
            name: None,
        }
        .into();
        assert_eq!(err.category(), "policy");
    }
}
