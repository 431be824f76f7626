//! A collection of policies evaluated together.

use std::sync::Arc;

use intercept_core::MethodIdentity;
use intercept_pipeline::Interceptor;
use tracing::debug;

use crate::errors::Result;
use crate::policy::Policy;
use crate::resolver::{InterceptorResolver, ResolutionContext};

/// Ordered set of policies.
///
/// Handlers from matching policies are merged in policy order. A handler
/// instance contributed by more than one policy appears once. The merged
/// list is then ordered: handlers with a non-zero
/// [`order`](Interceptor::order) first, ascending, followed by unordered
/// handlers. Both groups keep contribution order among equals.
#[derive(Default, Clone)]
pub struct PolicySet {
    policies: Vec<Arc<dyn Policy>>,
}

impl PolicySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a policy.
    pub fn add(&mut self, policy: Arc<dyn Policy>) {
        debug!(policy = policy.name(), "policy added");
        self.policies.push(policy);
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, policy: Arc<dyn Policy>) -> Self {
        self.add(policy);
        self
    }

    /// Number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policy names in order.
    pub fn names(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Policies that apply to `member`.
    pub fn policies_for(&self, member: &MethodIdentity) -> Vec<Arc<dyn Policy>> {
        self.policies
            .iter()
            .filter(|p| p.applies_to(member))
            .cloned()
            .collect()
    }

    /// Policies that do not apply to `member`.
    pub fn policies_not_for(&self, member: &MethodIdentity) -> Vec<Arc<dyn Policy>> {
        self.policies
            .iter()
            .filter(|p| !p.applies_to(member))
            .cloned()
            .collect()
    }

    /// Keep only the policies for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&dyn Policy) -> bool) {
        self.policies.retain(|p| keep(p.as_ref()));
    }

    /// Merged, ordered handlers for `member`.
    pub fn handlers_for(
        &self,
        member: &MethodIdentity,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>> {
        let mut merged: Vec<Arc<dyn Interceptor>> = Vec::new();
        for policy in &self.policies {
            for handler in policy.handlers_for(member, resolver, context)? {
                if !merged.iter().any(|h| same_unit(h.as_ref(), handler.as_ref())) {
                    merged.push(handler);
                }
            }
        }
        Ok(order_handlers(merged))
    }
}

/// Whether two handlers share one underlying unit, looking through
/// wrappers that only adjust metadata.
fn same_unit(a: &dyn Interceptor, b: &dyn Interceptor) -> bool {
    std::ptr::eq(innermost(a), innermost(b))
}

fn innermost(mut unit: &dyn Interceptor) -> *const () {
    while let Some(inner) = unit.wrapped() {
        unit = inner;
    }
    std::ptr::from_ref(unit).cast::<()>()
}

/// Ordered handlers first (ascending, stable), then unordered ones.
pub(crate) fn order_handlers(handlers: Vec<Arc<dyn Interceptor>>) -> Vec<Arc<dyn Interceptor>> {
    let (mut ordered, unordered): (Vec<_>, Vec<_>) =
        handlers.into_iter().partition(|h| h.order() != 0);
    ordered.sort_by_key(|h| h.order());
    ordered.extend(unordered);
    ordered
}

impl std::fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicySet")
            .field("policies", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{InterceptorRef, InterceptorRegistry};
    use crate::RuleDrivenPolicy;
    use intercept_core::{
        AssemblyName, CallInvocation, CallResult, HandlerDescriptor, MethodDecl, TypeInfo,
    };
    use intercept_pipeline::{FnInterceptor, Next, Pipeline};
    use intercept_rules::rules::NameRule;
    use intercept_rules::MatchingRule;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountHandler {
        count: AtomicUsize,
    }

    impl Interceptor for CountHandler {
        fn name(&self) -> &str {
            "count"
        }
        fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
            let _ = self.count.fetch_add(1, Ordering::SeqCst);
            next.invoke(call)
        }
    }

    fn unit(name: &'static str, order: i32) -> Arc<dyn Interceptor> {
        Arc::new(FnInterceptor::new(name, |call, next| next.invoke(call)).with_order(order))
    }

    fn account() -> Arc<TypeInfo> {
        TypeInfo::class("Bank.Account", AssemblyName::new("Bank"))
            .method(MethodDecl::new("Deposit").param("amount", "System.Int64"))
            .method(MethodDecl::new("Withdraw").param("amount", "System.Int64"))
            .build()
    }

    fn member(name: &str) -> MethodIdentity {
        MethodIdentity::for_implementation(account().method(name).unwrap())
    }

    #[test]
    fn ordered_handlers_come_first() {
        let handlers = vec![
            unit("a", 0),
            unit("b", 2),
            unit("c", 0),
            unit("d", 1),
            unit("e", 2),
        ];
        let names: Vec<_> = order_handlers(handlers)
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["d", "b", "e", "a", "c"]);
    }

    #[test]
    fn merges_policies_in_order_without_duplicates() {
        let shared = unit("shared", 0);
        let set = PolicySet::new()
            .with(Arc::new(
                RuleDrivenPolicy::new("first")
                    .with_rule(MatchingRule::Always)
                    .with_handler(unit("one", 0))
                    .with_handler(Arc::clone(&shared)),
            ))
            .with(Arc::new(
                RuleDrivenPolicy::new("second")
                    .with_rule(MatchingRule::Always)
                    .with_handler(Arc::clone(&shared))
                    .with_handler(unit("two", 0)),
            ));
        let names: Vec<_> = set
            .handlers_for(
                &member("Deposit"),
                &InterceptorRegistry::new(),
                &ResolutionContext::default(),
            )
            .unwrap()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["one", "shared", "two"]);
        assert_eq!(set.names(), vec!["first", "second"]);
    }

    #[test]
    fn withdraw_policy_counts_only_withdraw_calls() {
        let count = Arc::new(CountHandler::default());
        let log = unit("log", 0);
        let set = PolicySet::new().with(Arc::new(
            RuleDrivenPolicy::new("withdrawals")
                .with_rule(MatchingRule::Name(NameRule::new("Withdraw").unwrap()))
                .with_handler(Arc::clone(&count) as Arc<dyn Interceptor>)
                .with_handler(log),
        ));
        let registry = InterceptorRegistry::new();
        let ctx = ResolutionContext::default();

        let deposit = member("Deposit");
        let withdraw = member("Withdraw");
        let deposit_pipeline: Pipeline = set
            .handlers_for(&deposit, &registry, &ctx)
            .unwrap()
            .into_iter()
            .collect();
        let withdraw_pipeline: Pipeline = set
            .handlers_for(&withdraw, &registry, &ctx)
            .unwrap()
            .into_iter()
            .collect();
        assert!(deposit_pipeline.is_empty());
        assert_eq!(withdraw_pipeline.names(), vec!["count", "log"]);

        let target = |call: &mut CallInvocation| call.create_return(None);
        let mut call =
            CallInvocation::new(Arc::new(()), deposit, vec![serde_json::json!(10)]).unwrap();
        let _ = deposit_pipeline.invoke(&mut call, &target);
        for _ in 0..3 {
            let mut call =
                CallInvocation::new(Arc::new(()), withdraw.clone(), vec![serde_json::json!(1)])
                    .unwrap();
            let _ = withdraw_pipeline.invoke(&mut call, &target);
        }
        assert_eq!(count.count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn ordered_registry_handler_shared_by_policies_runs_once() {
        let count = Arc::new(CountHandler::default());
        let mut registry = InterceptorRegistry::new();
        registry.register_instance("Audit", Arc::clone(&count) as Arc<dyn Interceptor>);
        let audit = || InterceptorRef::Resolve(HandlerDescriptor::new("Audit").with_order(1));
        let set = PolicySet::new()
            .with(Arc::new(
                RuleDrivenPolicy::new("first")
                    .with_rule(MatchingRule::Always)
                    .with_handler_ref(audit()),
            ))
            .with(Arc::new(
                RuleDrivenPolicy::new("second")
                    .with_rule(MatchingRule::Always)
                    .with_handler_ref(audit()),
            ));

        let deposit = member("Deposit");
        let handlers = set
            .handlers_for(&deposit, &registry, &ResolutionContext::default())
            .unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].order(), 1);

        let pipeline: Pipeline = handlers.into_iter().collect();
        let target = |call: &mut CallInvocation| call.create_return(None);
        let mut call = CallInvocation::new(Arc::new(()), deposit, vec![serde_json::json!(1)]).unwrap();
        let _ = pipeline.invoke(&mut call, &target);
        assert_eq!(count.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn policies_for_and_retain() {
        let mut set = PolicySet::new()
            .with(Arc::new(
                RuleDrivenPolicy::new("deposits")
                    .with_rule(MatchingRule::Name(NameRule::new("Deposit").unwrap())),
            ))
            .with(Arc::new(RuleDrivenPolicy::new("never").with_rule(MatchingRule::Never)));
        let deposit = member("Deposit");
        assert_eq!(set.policies_for(&deposit).len(), 1);
        assert_eq!(set.policies_not_for(&deposit).len(), 1);

        set.retain(|p| p.name() != "deposits");
        assert_eq!(set.len(), 1);
        assert!(set.policies_for(&deposit).is_empty());
    }
}
