//! Effective-behavior resolution.
//!
//! A proxy's behavior chain is assembled from two sources:
//!
//! 1. behaviors attached explicitly, in attachment order
//! 2. behaviors contributed by keys (policies, configuration), in
//!    contribution order
//!
//! Every reference is resolved once per build with a [`ResolutionContext`]
//! naming the interceptor and type pair being built. Units whose
//! [`will_execute`](Interceptor::will_execute) is `false` are dropped.

use std::sync::Arc;

use intercept_pipeline::{Interceptor, Pipeline};
use intercept_policy::{InterceptorRef, InterceptorResolver, ResolutionContext};
use tracing::debug;

use crate::errors::Result;

/// Behavior references for one proxy.
#[derive(Clone, Debug, Default)]
pub struct BehaviorSet {
    explicit: Vec<InterceptorRef>,
    contributed: Vec<InterceptorRef>,
}

impl BehaviorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a behavior directly.
    pub fn attach(&mut self, behavior: impl Into<InterceptorRef>) {
        self.explicit.push(behavior.into());
    }

    /// Add a behavior contributed by a key source.
    pub fn contribute(&mut self, behavior: impl Into<InterceptorRef>) {
        self.contributed.push(behavior.into());
    }

    /// Builder form of [`attach`](Self::attach).
    #[must_use]
    pub fn with_attached(mut self, behavior: impl Into<InterceptorRef>) -> Self {
        self.attach(behavior);
        self
    }

    /// Builder form of [`contribute`](Self::contribute).
    #[must_use]
    pub fn with_contributed(mut self, behavior: impl Into<InterceptorRef>) -> Self {
        self.contribute(behavior);
        self
    }

    /// Explicitly attached references.
    #[must_use]
    pub fn attached(&self) -> &[InterceptorRef] {
        &self.explicit
    }

    /// Key-contributed references.
    #[must_use]
    pub fn contributed(&self) -> &[InterceptorRef] {
        &self.contributed
    }

    /// Total number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.explicit.len() + self.contributed.len()
    }

    /// Whether no behavior is referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the effective behaviors: attached first, then contributed,
    /// skipping units that opt out.
    pub fn resolve(
        &self,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>> {
        let mut effective = Vec::with_capacity(self.len());
        for reference in self.explicit.iter().chain(&self.contributed) {
            let unit = reference.resolve(resolver, context)?;
            if unit.will_execute() {
                effective.push(unit);
            } else {
                debug!(behavior = unit.name(), "behavior opted out of execution");
            }
        }
        debug!(
            interceptor = ?context.interceptor,
            behaviors = effective.len(),
            "effective behaviors resolved"
        );
        Ok(effective)
    }
}

/// Pipeline over `units`, dropping those that opt out.
pub(crate) fn executable_pipeline(units: impl IntoIterator<Item = Arc<dyn Interceptor>>) -> Pipeline {
    units.into_iter().filter(|u| u.will_execute()).collect()
}
