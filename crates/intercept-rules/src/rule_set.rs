//! Conjunction of matching rules.

use intercept_core::MethodSignature;
use tracing::trace;

use crate::rules::MatchingRule;

/// Ordered collection of rules that must all match.
///
/// An empty set matches nothing, so a policy without rules never applies.
/// Evaluation stops at the first rule that does not match.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<MatchingRule>,
}

impl RuleSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn add(&mut self, rule: MatchingRule) {
        self.rules.push(rule);
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, rule: MatchingRule) -> Self {
        self.add(rule);
        self
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchingRule> {
        self.rules.iter()
    }

    /// Whether every rule matches `method`. Always `false` when empty.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let matched = self.rules.iter().all(|r| r.matches(method));
        trace!(method = %method, rules = self.rules.len(), matched, "rule set evaluated");
        matched
    }
}

impl FromIterator<MatchingRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = MatchingRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Extend<MatchingRule> for RuleSet {
    fn extend<I: IntoIterator<Item = MatchingRule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a MatchingRule;
    type IntoIter = std::slice::Iter<'a, MatchingRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
