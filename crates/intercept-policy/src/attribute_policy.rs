//! Attribute-driven policy.

use std::sync::Arc;

use intercept_core::{HandlerDescriptor, MethodIdentity, MethodSignature};
use intercept_pipeline::Interceptor;
use tracing::debug;

use crate::errors::Result;
use crate::metadata::{DeclaredMetadata, MetadataSource};
use crate::policy::Policy;
use crate::resolver::{InterceptorResolver, ResolutionContext};

/// Name the attribute-driven policy reports.
pub const ATTRIBUTE_POLICY_NAME: &str = "attributes";

/// Applies the handlers declared by handler attributes.
///
/// For the interface method (if any) and then the implementation method,
/// handler attributes on the declaring type come first, followed by those on
/// the method itself. Inherited attributes are included.
pub struct AttributeDrivenPolicy {
    metadata: Arc<dyn MetadataSource>,
}

impl AttributeDrivenPolicy {
    /// Policy reading the declared metadata model.
    #[must_use]
    pub fn new() -> Self {
        Self::with_metadata(Arc::new(DeclaredMetadata))
    }

    /// Policy reading attributes from `metadata`.
    #[must_use]
    pub fn with_metadata(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    fn descriptors_on(&self, method: &MethodSignature) -> Vec<HandlerDescriptor> {
        self.metadata
            .type_attributes(method.declaring_type(), true)
            .into_iter()
            .chain(self.metadata.method_attributes(method, true))
            .filter_map(|a| a.as_handler().cloned())
            .collect()
    }

    /// Handler descriptors for `member`, in the order handlers are produced.
    #[must_use]
    pub fn descriptors(&self, member: &MethodIdentity) -> Vec<HandlerDescriptor> {
        member.methods().flat_map(|m| self.descriptors_on(m)).collect()
    }
}

impl Default for AttributeDrivenPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for AttributeDrivenPolicy {
    fn name(&self) -> &str {
        ATTRIBUTE_POLICY_NAME
    }

    fn metadata(&self) -> &dyn MetadataSource {
        self.metadata.as_ref()
    }

    fn matches(&self, member: &MethodIdentity) -> bool {
        member.methods().any(|m| !self.descriptors_on(m).is_empty())
    }

    fn resolve_handlers(
        &self,
        member: &MethodIdentity,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>> {
        let handlers = self
            .descriptors(member)
            .iter()
            .map(|d| resolver.resolve(d, context))
            .collect::<Result<Vec<_>>>()?;
        debug!(method = %member, handlers = handlers.len(), "attribute handlers resolved");
        Ok(handlers)
    }
}

impl std::fmt::Debug for AttributeDrivenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeDrivenPolicy").finish_non_exhaustive()
    }
}
