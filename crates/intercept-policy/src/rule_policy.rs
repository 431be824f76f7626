//! Rule-driven policy.

use std::sync::Arc;

use intercept_core::MethodIdentity;
use intercept_pipeline::Interceptor;
use intercept_rules::{MatchingRule, RuleSet};
use tracing::debug;

use crate::errors::Result;
use crate::metadata::{DeclaredMetadata, MetadataSource};
use crate::policy::Policy;
use crate::resolver::{InterceptorRef, InterceptorResolver, ResolutionContext};

/// Applies a fixed handler list to every method its rule set matches.
///
/// A call matches when the rules match its interface method or its
/// implementation method. With no rules the policy never applies.
pub struct RuleDrivenPolicy {
    name: String,
    rules: RuleSet,
    handlers: Vec<InterceptorRef>,
    metadata: Arc<dyn MetadataSource>,
}

impl RuleDrivenPolicy {
    /// Create a policy with no rules and no handlers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: RuleSet::new(),
            handlers: Vec::new(),
            metadata: Arc::new(DeclaredMetadata),
        }
    }

    /// Append a rule.
    pub fn add_rule(&mut self, rule: MatchingRule) -> &mut Self {
        self.rules.add(rule);
        self
    }

    /// Append a handler instance.
    pub fn add_handler(&mut self, handler: Arc<dyn Interceptor>) -> &mut Self {
        self.handlers.push(InterceptorRef::Instance(handler));
        self
    }

    /// Append a handler reference resolved when pipelines are built.
    pub fn add_handler_ref(&mut self, handler: InterceptorRef) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    #[must_use]
    pub fn with_rule(mut self, rule: MatchingRule) -> Self {
        let _ = self.add_rule(rule);
        self
    }

    /// Builder form of [`add_handler`](Self::add_handler).
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn Interceptor>) -> Self {
        let _ = self.add_handler(handler);
        self
    }

    /// Builder form of [`add_handler_ref`](Self::add_handler_ref).
    #[must_use]
    pub fn with_handler_ref(mut self, handler: InterceptorRef) -> Self {
        let _ = self.add_handler_ref(handler);
        self
    }

    /// Use a different metadata source for the no-policies check.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSource>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Configured rules.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Configured handlers in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[InterceptorRef] {
        &self.handlers
    }
}

impl Policy for RuleDrivenPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> &dyn MetadataSource {
        self.metadata.as_ref()
    }

    fn matches(&self, member: &MethodIdentity) -> bool {
        member.methods().any(|m| self.rules.matches(m))
    }

    fn resolve_handlers(
        &self,
        member: &MethodIdentity,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>> {
        let handlers = self
            .handlers
            .iter()
            .map(|h| h.resolve(resolver, context))
            .collect::<Result<Vec<_>>>()?;
        debug!(policy = %self.name, method = %member, handlers = handlers.len(), "policy matched");
        Ok(handlers)
    }
}

impl std::fmt::Debug for RuleDrivenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDrivenPolicy")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
