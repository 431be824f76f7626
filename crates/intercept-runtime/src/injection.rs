//! Policy-injection behavior.
//!
//! Bridges policies into a behavior chain: each interceptable method gets a
//! handler pipeline computed from a [`PolicySet`], and the behavior runs that
//! pipeline with the rest of the behavior chain as its target.

use std::fmt;
use std::sync::Arc;

use intercept_core::{CallException, CallInvocation, CallResult, MethodIdentity};
use intercept_pipeline::{Interceptor, Next, Pipeline, PipelineManager};
use intercept_policy::{InterceptorResolver, PolicySet, ResolutionContext};
use tracing::{debug, trace};

use crate::behaviors::executable_pipeline;
use crate::errors::Result;

/// Name the policy-injection behavior reports.
pub const POLICY_INJECTION_NAME: &str = "policy-injection";

/// Behavior that runs policy handlers around each intercepted method.
pub struct PolicyInjectionBehavior {
    policies: PolicySet,
    resolver: Arc<dyn InterceptorResolver>,
    context: ResolutionContext,
    pipelines: PipelineManager,
    cache_pipelines: bool,
    has_handlers: bool,
}

impl PolicyInjectionBehavior {
    /// Compute handler pipelines for `methods`.
    ///
    /// Handler references are resolved here, so configuration problems
    /// surface before the first call.
    pub fn new(
        policies: PolicySet,
        resolver: Arc<dyn InterceptorResolver>,
        context: ResolutionContext,
        methods: &[MethodIdentity],
    ) -> Result<Self> {
        let pipelines = PipelineManager::new();
        for method in methods {
            let pipeline = build_pipeline(&policies, resolver.as_ref(), &context, method)?;
            pipelines.set(method.clone(), pipeline);
        }
        let has_handlers = pipelines.has_units();
        debug!(
            methods = methods.len(),
            policies = policies.len(),
            has_handlers,
            "policy injection prepared"
        );
        Ok(Self {
            policies,
            resolver,
            context,
            pipelines,
            cache_pipelines: true,
            has_handlers,
        })
    }

    /// Rebuild each method's pipeline on every call instead of reusing the
    /// one computed at construction.
    #[must_use]
    pub fn with_cache_pipelines(mut self, cache: bool) -> Self {
        self.cache_pipelines = cache;
        self
    }

    /// Pipeline for `method`; empty when no policy applies.
    #[must_use]
    pub fn pipeline_for(&self, method: &MethodIdentity) -> Arc<Pipeline> {
        self.pipelines.get(method)
    }

    /// Policies this behavior evaluates.
    #[must_use]
    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }
}

fn build_pipeline(
    policies: &PolicySet,
    resolver: &dyn InterceptorResolver,
    context: &ResolutionContext,
    method: &MethodIdentity,
) -> Result<Pipeline> {
    let handlers = policies.handlers_for(method, resolver, context)?;
    Ok(executable_pipeline(handlers))
}

impl Interceptor for PolicyInjectionBehavior {
    fn name(&self) -> &str {
        POLICY_INJECTION_NAME
    }

    fn will_execute(&self) -> bool {
        self.has_handlers
    }

    fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
        let pipeline = if self.cache_pipelines || !self.pipelines.contains(call.identity()) {
            self.pipelines.get(call.identity())
        } else {
            let built = build_pipeline(
                &self.policies,
                self.resolver.as_ref(),
                &self.context,
                call.identity(),
            );
            match built {
                Ok(pipeline) => Arc::new(pipeline),
                Err(error) => return call.create_exception(CallException::new(error)),
            }
        };
        trace!(method = %call.identity(), handlers = pipeline.count(), "running policy handlers");
        pipeline.invoke(call, &|call: &mut CallInvocation| next.invoke(call))
    }
}

impl fmt::Debug for PolicyInjectionBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyInjectionBehavior")
            .field("policies", &self.policies)
            .field("methods", &self.pipelines.len())
            .field("cache_pipelines", &self.cache_pipelines)
            .finish_non_exhaustive()
    }
}
