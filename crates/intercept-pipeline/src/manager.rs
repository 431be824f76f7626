//! Per-method pipeline cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use intercept_core::MethodIdentity;
use parking_lot::RwLock;
use tracing::debug;

use crate::pipeline::Pipeline;

/// Maps each method identity to the pipeline built for it.
///
/// Lookups for a method that was never registered yield a shared empty
/// pipeline, which forwards straight to the target.
pub struct PipelineManager {
    pipelines: RwLock<HashMap<MethodIdentity, Arc<Pipeline>>>,
    empty: Arc<Pipeline>,
}

impl PipelineManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
            empty: Arc::new(Pipeline::new()),
        }
    }

    /// Pipeline for `method`, or the empty pipeline.
    #[must_use]
    pub fn get(&self, method: &MethodIdentity) -> Arc<Pipeline> {
        self.pipelines
            .read()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// Whether a pipeline is registered for `method`.
    #[must_use]
    pub fn contains(&self, method: &MethodIdentity) -> bool {
        self.pipelines.read().contains_key(method)
    }

    /// Register a pipeline for `method`, replacing any previous one.
    pub fn set(&self, method: MethodIdentity, pipeline: Pipeline) {
        debug!(method = %method, units = pipeline.count(), "pipeline registered");
        let _ = self.pipelines.write().insert(method, Arc::new(pipeline));
    }

    /// Pipeline for `method`, building and registering it on first use.
    ///
    /// `build` runs at most once per method even under concurrent callers.
    pub fn initialize(&self, method: &MethodIdentity, build: impl FnOnce() -> Pipeline) -> Arc<Pipeline> {
        if let Some(existing) = self.pipelines.read().get(method) {
            return Arc::clone(existing);
        }
        let mut pipelines = self.pipelines.write();
        let entry = pipelines.entry(method.clone()).or_insert_with(|| {
            let pipeline = build();
            debug!(method = %method, units = pipeline.count(), "pipeline built");
            Arc::new(pipeline)
        });
        Arc::clone(entry)
    }

    /// Drop every cached pipeline.
    pub fn clear(&self) {
        self.pipelines.write().clear();
    }

    /// Number of registered pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.read().len()
    }

    /// Whether no pipelines are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.read().is_empty()
    }

    /// Whether any registered pipeline has at least one unit.
    #[must_use]
    pub fn has_units(&self) -> bool {
        self.pipelines.read().values().any(|p| !p.is_empty())
    }
}

impl Default for PipelineManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineManager")
            .field("pipelines", &self.len())
            .finish()
    }
}
