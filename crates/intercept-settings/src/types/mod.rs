//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]`. Each type implements
//! [`Default`] with production default values, and `#[serde(default)]` allows
//! partial JSON: missing fields get their default during deserialization.

mod policies;

pub use policies::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the interception engine.
///
/// Loaded from `~/.intercept/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "pipeline": { "cachePipelines": false },
///   "policies": [
///     {
///       "name": "audit-withdrawals",
///       "rules": [{ "kind": "name", "patterns": ["Withdraw*"] }],
///       "handlers": [{ "type": "Audit" }]
///     }
///   ],
///   "disabledPolicies": ["legacy"]
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptSettings {
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Pipeline construction settings.
    pub pipeline: PipelineSettings,
    /// Declarative rule-driven policies.
    pub policies: Vec<PolicyConfig>,
    /// Policy names dropped when building a policy set.
    pub disabled_policies: Vec<String>,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Pipeline construction settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    /// Build each method's pipeline once and reuse it.
    pub cache_pipelines: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cache_pipelines: true,
        }
    }
}
