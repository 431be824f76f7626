//! Matching rule variants and evaluation dispatch.
//!
//! Each variant wraps a rule struct that implements its own `matches`. The
//! [`MatchingRule`] enum dispatches to the appropriate implementation.

pub mod assembly;
pub mod attributes;
pub mod logic;
pub mod name;
pub mod types;

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use intercept_core::MethodSignature;

use crate::errors::{Result, RuleError};

pub use assembly::AssemblyRule;
pub use attributes::{CustomAttributeRule, TagAttributeRule};
pub use logic::{AnyRule, NegateRule, PredicateRule};
pub use name::{NameRule, NamespaceRule, PropertyAccess, PropertyRule};
pub use types::{ParameterKind, ParameterTypeMatch, ParameterTypeRule, ReturnTypeRule, SignatureRule, TypeRule};

/// Union of all matching rules.
#[derive(Clone)]
pub enum MatchingRule {
    /// Matches every method.
    Always,
    /// Matches no method.
    Never,
    /// Method name against wildcard patterns.
    Name(NameRule),
    /// Declaring type's namespace.
    Namespace(NamespaceRule),
    /// Property accessor by property name and access kind.
    Property(PropertyRule),
    /// Declaring type's defining assembly.
    Assembly(AssemblyRule),
    /// Return type.
    ReturnType(ReturnTypeRule),
    /// Exact positional parameter types.
    Signature(SignatureRule),
    /// Presence of a parameter (or return value) of a given type.
    ParameterType(ParameterTypeRule),
    /// Exact declaring type.
    Type(TypeRule),
    /// Tag attribute on the method or its declaring type.
    Tag(TagAttributeRule),
    /// Named custom attribute on the method.
    CustomAttribute(CustomAttributeRule),
    /// Inverts an inner rule.
    Negate(NegateRule),
    /// Matches when any inner rule matches.
    Any(AnyRule),
    /// Arbitrary predicate.
    Predicate(PredicateRule),
}

impl MatchingRule {
    /// Whether the rule matches `method`.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Name(r) => r.matches(method),
            Self::Namespace(r) => r.matches(method),
            Self::Property(r) => r.matches(method),
            Self::Assembly(r) => r.matches(method),
            Self::ReturnType(r) => r.matches(method),
            Self::Signature(r) => r.matches(method),
            Self::ParameterType(r) => r.matches(method),
            Self::Type(r) => r.matches(method),
            Self::Tag(r) => r.matches(method),
            Self::CustomAttribute(r) => r.matches(method),
            Self::Negate(r) => r.matches(method),
            Self::Any(r) => r.matches(method),
            Self::Predicate(r) => r.matches(method),
        }
    }

    /// Invert this rule.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Negate(NegateRule::new(self))
    }

    /// Short variant name, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Name(_) => "name",
            Self::Namespace(_) => "namespace",
            Self::Property(_) => "property",
            Self::Assembly(_) => "assembly",
            Self::ReturnType(_) => "returnType",
            Self::Signature(_) => "signature",
            Self::ParameterType(_) => "parameterType",
            Self::Type(_) => "type",
            Self::Tag(_) => "tag",
            Self::CustomAttribute(_) => "customAttribute",
            Self::Negate(_) => "not",
            Self::Any(_) => "any",
            Self::Predicate(_) => "predicate",
        }
    }
}

impl fmt::Debug for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Name(r) => f.debug_tuple("Name").field(r).finish(),
            Self::Namespace(r) => f.debug_tuple("Namespace").field(r).finish(),
            Self::Property(r) => f.debug_tuple("Property").field(r).finish(),
            Self::Assembly(r) => f.debug_tuple("Assembly").field(r).finish(),
            Self::ReturnType(r) => f.debug_tuple("ReturnType").field(r).finish(),
            Self::Signature(r) => f.debug_tuple("Signature").field(r).finish(),
            Self::ParameterType(r) => f.debug_tuple("ParameterType").field(r).finish(),
            Self::Type(r) => f.debug_tuple("Type").field(r).finish(),
            Self::Tag(r) => f.debug_tuple("Tag").field(r).finish(),
            Self::CustomAttribute(r) => f.debug_tuple("CustomAttribute").field(r).finish(),
            Self::Negate(r) => f.debug_tuple("Negate").field(r).finish(),
            Self::Any(r) => f.debug_tuple("Any").field(r).finish(),
            Self::Predicate(r) => f.debug_tuple("Predicate").field(r).finish(),
        }
    }
}

/// Compiled `*` / `?` wildcard pattern.
#[derive(Clone)]
pub(crate) struct Wildcard {
    pattern: String,
    matcher: GlobMatcher,
}

impl Wildcard {
    pub(crate) fn new(pattern: &str, ignore_case: bool) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
