//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`InterceptSettings::default()`]
//! 2. If `~/.intercept/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::InterceptSettings;

/// Resolve the path to the settings file (`~/.intercept/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".intercept").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<InterceptSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<InterceptSettings> {
    let mut settings = merge_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn merge_file(path: &Path) -> Result<InterceptSettings> {
    let defaults = serde_json::to_value(InterceptSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// - `INTERCEPT_LOG_LEVEL`: non-empty filter directive
/// - `INTERCEPT_CACHE_PIPELINES`: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - `INTERCEPT_DISABLED_POLICIES`: comma-separated policy names, appended
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut InterceptSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut InterceptSettings, var: impl Fn(&str) -> Option<String>) {
    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = var("INTERCEPT_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
        settings.logging.level = v;
    }

    // ── Pipeline ────────────────────────────────────────────────────
    if let Some(v) = var("INTERCEPT_CACHE_PIPELINES") {
        match parse_bool(&v) {
            Some(b) => settings.pipeline.cache_pipelines = b,
            None => warn!(key = "INTERCEPT_CACHE_PIPELINES", value = %v, "invalid boolean env var, ignoring"),
        }
    }

    // ── Policies ────────────────────────────────────────────────────
    if let Some(v) = var("INTERCEPT_DISABLED_POLICIES") {
        for name in parse_list(&v) {
            if !settings.disabled_policies.contains(&name) {
                settings.disabled_policies.push(name);
            }
        }
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
