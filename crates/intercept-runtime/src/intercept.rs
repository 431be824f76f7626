//! Entry point for creating intercepting proxies.

use std::fmt;
use std::sync::Arc;

use intercept_core::{InterceptError, TypeInfo};
use intercept_pipeline::Interceptor;
use intercept_policy::{InterceptorResolver, Policy, PolicySet, ResolutionContext};
use intercept_settings::InterceptSettings;
use tracing::debug;

use crate::behaviors::BehaviorSet;
use crate::errors::{Result, RuntimeError};
use crate::injection::PolicyInjectionBehavior;
use crate::proxy::{Dispatch, InterceptingProxy, ProxyFactory};

/// Builds intercepting proxies from policies, behaviors, and a resolver.
///
/// # Example
///
/// ```ignore
/// let intercept = Intercept::new(Arc::new(registry)).with_policies(policies);
/// let proxy = intercept.through_proxy(
///     contract,
///     Arc::new(account),
///     &InterfaceProxyFactory::new(),
///     BehaviorSet::new(),
/// )?;
/// let result = proxy.invoke("Withdraw", vec![json!(10)])?;
/// ```
pub struct Intercept {
    resolver: Arc<dyn InterceptorResolver>,
    policies: PolicySet,
    cache_pipelines: bool,
}

impl Intercept {
    /// Interception with no policies, resolving references through
    /// `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn InterceptorResolver>) -> Self {
        Self {
            resolver,
            policies: PolicySet::new(),
            cache_pipelines: true,
        }
    }

    /// Interception configured from settings.
    ///
    /// `programmatic` policies come first, followed by the enabled policies
    /// the settings declare; policies named in `disabledPolicies` are dropped.
    pub fn from_settings(
        settings: &InterceptSettings,
        resolver: Arc<dyn InterceptorResolver>,
        programmatic: impl IntoIterator<Item = Arc<dyn Policy>>,
    ) -> Result<Self> {
        let policies = settings.policy_set(programmatic)?;
        debug!(policies = ?policies.names(), cache = settings.pipeline.cache_pipelines, "interception configured");
        Ok(Self::new(resolver)
            .with_policies(policies)
            .with_cache_pipelines(settings.pipeline.cache_pipelines))
    }

    /// Replace the policy set.
    #[must_use]
    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }

    /// Add one policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn Policy>) -> Self {
        self.policies.add(policy);
        self
    }

    /// Whether pipelines are built once per method and reused.
    #[must_use]
    pub fn with_cache_pipelines(mut self, cache: bool) -> Self {
        self.cache_pipelines = cache;
        self
    }

    /// Configured policies.
    #[must_use]
    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Wrap `target` so calls through `contract` run the effective behaviors.
    ///
    /// The effective behaviors are the attached behaviors of `behaviors`,
    /// then its contributed ones, then a policy-injection behavior when any
    /// policy applies to an intercepted method.
    pub fn through_proxy<T: Dispatch + 'static>(
        &self,
        contract: Arc<TypeInfo>,
        target: Arc<T>,
        factory: &dyn ProxyFactory,
        behaviors: BehaviorSet,
    ) -> Result<InterceptingProxy> {
        let implementation = target.type_info();
        if !factory.can_intercept(&contract) {
            return Err(RuntimeError::CannotIntercept {
                type_name: contract.full_name(),
                reason: format!("not supported by the {} proxy", factory.name()),
            });
        }
        if !implementation.is_assignable_to(&contract) {
            return Err(InterceptError::NotAssignable {
                contract: contract.full_name(),
                implementation: implementation.full_name(),
            }
            .into());
        }

        let methods = factory.interceptable_methods(&contract, &implementation)?;
        let context = ResolutionContext::new(Arc::clone(&contract), Arc::clone(&implementation))
            .with_interceptor(factory.name());

        let mut behaviors = behaviors;
        if !self.policies.is_empty() {
            let injection = PolicyInjectionBehavior::new(
                self.policies.clone(),
                Arc::clone(&self.resolver),
                context.clone(),
                &methods,
            )?
            .with_cache_pipelines(self.cache_pipelines);
            let injection: Arc<dyn Interceptor> = Arc::new(injection);
            behaviors.contribute(injection);
        }
        let effective = behaviors.resolve(self.resolver.as_ref(), &context)?;

        debug!(
            contract = %contract,
            implementation = %implementation,
            proxy = factory.name(),
            methods = methods.len(),
            behaviors = effective.len(),
            "proxy created"
        );
        let mut proxy = InterceptingProxy::new(target, contract, factory.kind(), methods, effective);
        proxy.set_cache_pipelines(self.cache_pipelines);
        Ok(proxy)
    }
}

impl fmt::Debug for Intercept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intercept")
            .field("policies", &self.policies)
            .field("cache_pipelines", &self.cache_pipelines)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{InterfaceProxyFactory, VirtualMethodProxyFactory};
    use assert_matches::assert_matches;
    use intercept_core::{AssemblyName, MethodDecl, MethodSignature};
    use intercept_pipeline::FnInterceptor;
    use intercept_policy::{InterceptorRegistry, RuleDrivenPolicy};
    use intercept_rules::MatchingRule;
    use serde_json::{Value, json};

    struct Echo(Arc<TypeInfo>);

    impl Dispatch for Echo {
        fn type_info(&self) -> Arc<TypeInfo> {
            Arc::clone(&self.0)
        }
        fn invoke(&self, _method: &MethodSignature, arguments: &mut [Value]) -> anyhow::Result<Option<Value>> {
            Ok(arguments.first().cloned())
        }
    }

    fn types() -> (Arc<TypeInfo>, Arc<TypeInfo>) {
        let contract = TypeInfo::interface("Demo.IEcho", AssemblyName::new("Demo"))
            .method(MethodDecl::new("Say").param("text", "System.String").returns("System.String"))
            .build();
        let echo = TypeInfo::class("Demo.Echo", AssemblyName::new("Demo"))
            .implements(Arc::clone(&contract))
            .method(MethodDecl::new("Say").param("text", "System.String").returns("System.String"))
            .build();
        (contract, echo)
    }

    fn upper() -> Arc<dyn Interceptor> {
        Arc::new(FnInterceptor::new("upper", |call, next| {
            let mut result = next.invoke(call);
            let shouted = result
                .return_value()
                .and_then(Value::as_str)
                .map(str::to_uppercase);
            if let Some(text) = shouted {
                result.set_return_value(Some(json!(text)));
            }
            result
        }))
    }

    #[test]
    fn without_policies_only_explicit_behaviors_run() {
        let (contract, echo) = types();
        let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
        let proxy = intercept
            .through_proxy(
                contract,
                Arc::new(Echo(echo)),
                &InterfaceProxyFactory::new(),
                BehaviorSet::new().with_attached(upper()),
            )
            .unwrap();
        let names: Vec<_> = proxy.behaviors().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["upper"]);
        let result = proxy.invoke("Say", vec![json!("hi")]).unwrap();
        assert_eq!(result.return_value(), Some(&json!("HI")));
    }

    #[test]
    fn matching_policies_add_the_injection_behavior_last() {
        let (contract, echo) = types();
        let intercept = Intercept::new(Arc::new(InterceptorRegistry::new())).with_policy(Arc::new(
            RuleDrivenPolicy::new("all")
                .with_rule(MatchingRule::Always)
                .with_handler(upper()),
        ));
        let proxy = intercept
            .through_proxy(
                contract,
                Arc::new(Echo(echo)),
                &InterfaceProxyFactory::new(),
                BehaviorSet::new(),
            )
            .unwrap();
        let names: Vec<_> = proxy.behaviors().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec![crate::POLICY_INJECTION_NAME]);
        let result = proxy.invoke("Say", vec![json!("quiet")]).unwrap();
        assert_eq!(result.return_value(), Some(&json!("QUIET")));
    }

    #[test]
    fn non_matching_policies_leave_no_injection_behavior() {
        let (contract, echo) = types();
        let intercept = Intercept::new(Arc::new(InterceptorRegistry::new())).with_policy(Arc::new(
            RuleDrivenPolicy::new("none")
                .with_rule(MatchingRule::Never)
                .with_handler(upper()),
        ));
        let proxy = intercept
            .through_proxy(
                contract,
                Arc::new(Echo(echo)),
                &InterfaceProxyFactory::new(),
                BehaviorSet::new(),
            )
            .unwrap();
        assert!(proxy.behaviors().is_empty());
    }

    #[test]
    fn rejects_contracts_the_factory_cannot_handle() {
        let (contract, echo) = types();
        let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
        assert_matches!(
            intercept.through_proxy(
                Arc::clone(&echo),
                Arc::new(Echo(Arc::clone(&echo))),
                &InterfaceProxyFactory::new(),
                BehaviorSet::new(),
            ),
            Err(RuntimeError::CannotIntercept { .. })
        );
        assert_matches!(
            intercept.through_proxy(
                contract,
                Arc::new(Echo(echo)),
                &VirtualMethodProxyFactory::new(),
                BehaviorSet::new(),
            ),
            Err(RuntimeError::CannotIntercept { .. })
        );
    }

    #[test]
    fn rejects_targets_not_implementing_the_contract() {
        let (contract, _) = types();
        let stranger = TypeInfo::class("Demo.Stranger", AssemblyName::new("Demo")).build();
        let intercept = Intercept::new(Arc::new(InterceptorRegistry::new()));
        assert_matches!(
            intercept.through_proxy(
                contract,
                Arc::new(Echo(stranger)),
                &InterfaceProxyFactory::new(),
                BehaviorSet::new(),
            ),
            Err(RuntimeError::Intercept(InterceptError::NotAssignable { .. }))
        );
    }
}
