//! Ordered interceptor chain.

use std::fmt;
use std::sync::Arc;

use intercept_core::{CallInvocation, CallResult};
use tracing::trace;

use crate::interceptor::{Interceptor, Next, Terminal};

/// Ordered list of interceptor units.
///
/// Units run in the order they were added; the pipeline never reorders
/// them. Build it, then share it: invocation only reads the unit list.
#[derive(Clone, Default)]
pub struct Pipeline {
    units: Vec<Arc<dyn Interceptor>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit.
    pub fn add(&mut self, unit: Arc<dyn Interceptor>) {
        self.units.push(unit);
    }

    /// Number of units.
    #[must_use]
    pub fn count(&self) -> usize {
        self.units.len()
    }

    /// Whether the pipeline has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in execution order.
    #[must_use]
    pub fn units(&self) -> &[Arc<dyn Interceptor>] {
        &self.units
    }

    /// Unit names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    /// Run `call` through every unit and finally `terminal`.
    ///
    /// With no units, `terminal` is called directly.
    pub fn invoke(&self, call: &mut CallInvocation, terminal: &Terminal<'_>) -> CallResult {
        trace!(method = %call.method(), units = self.units.len(), "pipeline invoke");
        Next::new(&self.units, 0, terminal).invoke(call)
    }
}

impl FromIterator<Arc<dyn Interceptor>> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Interceptor>>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("units", &self.names())
            .finish()
    }
}
