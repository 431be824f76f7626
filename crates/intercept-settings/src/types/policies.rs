//! Declarative policy settings.

use std::sync::Arc;

use intercept_core::HandlerDescriptor;
use intercept_policy::{InterceptorRef, Policy, PolicySet, RuleDrivenPolicy};
use intercept_rules::RuleConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::InterceptSettings;
use crate::errors::{Result, SettingsError};

fn default_true() -> bool {
    true
}

/// A rule-driven policy declared in settings.
///
/// Handlers are references resolved when pipelines are built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Policy name.
    pub name: String,
    /// Whether the policy is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Rules that must all match.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    /// Handlers in the order they run.
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

/// A handler reference declared in settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    /// Registered handler type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Optional registration name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Merge order; `0` means unordered.
    #[serde(default)]
    pub order: i32,
    /// Configuration passed to the handler factory.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl HandlerConfig {
    /// Descriptor the resolver receives.
    #[must_use]
    pub fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor {
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            order: self.order,
            config: self.config.clone(),
        }
    }
}

impl PolicyConfig {
    /// Build the rule-driven policy this entry declares.
    pub fn build(&self) -> Result<RuleDrivenPolicy> {
        if self.name.trim().is_empty() {
            return Err(SettingsError::InvalidValue("policy name is empty".to_string()));
        }
        let mut policy = RuleDrivenPolicy::new(self.name.clone());
        for rule in &self.rules {
            let rule = rule.build().map_err(|source| SettingsError::Rule {
                policy: self.name.clone(),
                source,
            })?;
            let _ = policy.add_rule(rule);
        }
        for handler in &self.handlers {
            if handler.type_name.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!(
                    "policy '{}' has a handler without a type",
                    self.name
                )));
            }
            let _ = policy.add_handler_ref(InterceptorRef::Resolve(handler.descriptor()));
        }
        if self.rules.is_empty() {
            warn!(policy = %self.name, "policy has no rules and will never apply");
        }
        Ok(policy)
    }
}

impl InterceptSettings {
    /// Build a policy set from `programmatic` policies followed by the
    /// enabled declared ones, dropping every policy named in
    /// `disabled_policies`.
    pub fn policy_set(
        &self,
        programmatic: impl IntoIterator<Item = Arc<dyn Policy>>,
    ) -> Result<PolicySet> {
        let mut set = PolicySet::new();
        for policy in programmatic {
            set.add(policy);
        }
        for config in &self.policies {
            if !config.enabled {
                debug!(policy = %config.name, "declared policy disabled");
                continue;
            }
            set.add(Arc::new(config.build()?));
        }
        set.retain(|p| {
            let keep = !self.is_disabled(p.name());
            if !keep {
                debug!(policy = p.name(), "policy disabled by settings");
            }
            keep
        });
        Ok(set)
    }

    /// Whether `name` appears in `disabled_policies`.
    #[must_use]
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_policies.iter().any(|d| d == name)
    }

    /// Install the global `tracing` subscriber at the configured level.
    pub fn init_logging(&self) {
        intercept_core::logging::init_subscriber(&self.logging.level);
    }
}
