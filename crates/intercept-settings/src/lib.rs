//! # intercept-settings
//!
//! Layered configuration for the interception engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`InterceptSettings::default()`]
//! 2. **User file**: `~/.intercept/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `INTERCEPT_*` overrides (highest priority)
//!
//! Besides logging and pipeline options, the file can declare rule-driven
//! policies. [`InterceptSettings::policy_set`] turns them into a
//! [`PolicySet`](intercept_policy::PolicySet) whose handlers are resolved
//! through an interceptor registry when pipelines are built.
//!
//! The engine's own APIs take settings as explicit parameters; the global
//! accessor below is a convenience for hosts.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<InterceptSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.intercept/settings.json` with env
/// var overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> &'static InterceptSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to load settings, using defaults");
            InterceptSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: InterceptSettings) -> std::result::Result<(), InterceptSettings> {
    SETTINGS.set(settings)
}
