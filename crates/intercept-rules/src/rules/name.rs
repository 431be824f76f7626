//! Name-based rules: method name, namespace, and property accessors.

use intercept_core::{MethodKind, MethodSignature};
use serde::{Deserialize, Serialize};

use super::Wildcard;
use crate::errors::Result;

/// Matches a method's simple name against one or more wildcard patterns.
///
/// Patterns support `*` and `?`. The rule matches if any pattern does.
#[derive(Debug, Clone)]
pub struct NameRule {
    patterns: Vec<Wildcard>,
}

impl NameRule {
    /// Case-sensitive rule with a single pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_patterns([pattern], false)
    }

    /// Rule over several patterns.
    pub fn with_patterns<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
        ignore_case: bool,
    ) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| Wildcard::new(p, ignore_case))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Configured patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Wildcard::pattern)
    }

    /// Whether any pattern matches the method name.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        self.patterns.iter().any(|p| p.is_match(method.name()))
    }
}

/// Matches the declaring type's namespace.
///
/// A pattern ending in `.*` matches the namespace before the `.*` as well as
/// every namespace nested beneath it.
#[derive(Debug, Clone)]
pub struct NamespaceRule {
    pattern: Wildcard,
    root: Option<Wildcard>,
}

impl NamespaceRule {
    /// Build a namespace rule.
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self> {
        let root = match pattern.strip_suffix(".*") {
            Some(prefix) if !prefix.is_empty() => Some(Wildcard::new(prefix, ignore_case)?),
            _ => None,
        };
        Ok(Self {
            pattern: Wildcard::new(pattern, ignore_case)?,
            root,
        })
    }

    /// Whether the declaring type's namespace matches.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        let namespace = method.declaring_type().namespace().unwrap_or_default();
        self.pattern.is_match(namespace)
            || self.root.as_ref().is_some_and(|r| r.is_match(namespace))
    }
}

/// Which property accessors a [`PropertyRule`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyAccess {
    /// Getters only.
    Get,
    /// Setters only.
    Set,
    /// Both accessors.
    #[default]
    GetOrSet,
}

impl PropertyAccess {
    fn admits(self, kind: MethodKind) -> bool {
        match (self, kind) {
            (Self::Get | Self::GetOrSet, MethodKind::PropertyGet)
            | (Self::Set | Self::GetOrSet, MethodKind::PropertySet) => true,
            _ => false,
        }
    }
}

/// Matches property accessor methods by property name.
#[derive(Debug, Clone)]
pub struct PropertyRule {
    pattern: Wildcard,
    access: PropertyAccess,
}

impl PropertyRule {
    /// Build a property rule.
    pub fn new(pattern: &str, access: PropertyAccess, ignore_case: bool) -> Result<Self> {
        Ok(Self {
            pattern: Wildcard::new(pattern, ignore_case)?,
            access,
        })
    }

    /// Whether `method` is a selected accessor of a matching property.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        if !self.access.admits(method.kind()) {
            return false;
        }
        method
            .property_name()
            .is_some_and(|name| self.pattern.is_match(name))
    }
}
