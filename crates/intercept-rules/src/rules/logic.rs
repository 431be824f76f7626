//! Logical combinators and predicate rules.

use std::fmt;
use std::sync::Arc;

use intercept_core::MethodSignature;

use super::MatchingRule;

/// Inverts an inner rule.
#[derive(Debug, Clone)]
pub struct NegateRule {
    inner: Box<MatchingRule>,
}

impl NegateRule {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: MatchingRule) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// The wrapped rule.
    #[must_use]
    pub fn inner(&self) -> &MatchingRule {
        &self.inner
    }

    /// `true` iff the inner rule does not match.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        !self.inner.matches(method)
    }
}

/// Matches when any member rule matches. An empty list matches nothing.
#[derive(Debug, Clone, Default)]
pub struct AnyRule {
    members: Vec<MatchingRule>,
}

impl AnyRule {
    /// Build from member rules.
    pub fn new(members: impl IntoIterator<Item = MatchingRule>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Member rules.
    #[must_use]
    pub fn members(&self) -> &[MatchingRule] {
        &self.members
    }

    /// Whether any member matches.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        self.members.iter().any(|r| r.matches(method))
    }
}

type PredicateFn = dyn Fn(&MethodSignature) -> bool + Send + Sync;

/// Arbitrary predicate, for rules that have no declarative form.
#[derive(Clone)]
pub struct PredicateRule {
    description: String,
    predicate: Arc<PredicateFn>,
}

impl PredicateRule {
    /// Wrap a predicate with a description used in logs.
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&MethodSignature) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        (self.predicate)(method)
    }
}

impl fmt::Debug for PredicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
