//! Policy trait and the no-policies exclusion.

use std::sync::Arc;

use intercept_core::{MethodIdentity, MethodSignature};
use intercept_pipeline::Interceptor;
use tracing::trace;

use crate::errors::Result;
use crate::metadata::MetadataSource;
use crate::resolver::{InterceptorResolver, ResolutionContext};

/// A named source of handlers for the methods it applies to.
///
/// Implementors supply [`matches`](Policy::matches) and
/// [`resolve_handlers`](Policy::resolve_handlers). The provided
/// [`applies_to`](Policy::applies_to) and [`handlers_for`](Policy::handlers_for)
/// run the no-policies exclusion first; callers should use those.
pub trait Policy: Send + Sync {
    /// Name used in logs and to disable the policy from settings.
    fn name(&self) -> &str;

    /// Metadata consulted for the no-policies exclusion.
    fn metadata(&self) -> &dyn MetadataSource;

    /// Policy-specific match, evaluated only for non-excluded methods.
    fn matches(&self, member: &MethodIdentity) -> bool;

    /// Policy-specific handler list, requested only for matching methods.
    fn resolve_handlers(
        &self,
        member: &MethodIdentity,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>>;

    /// Whether the policy contributes to `member`.
    fn applies_to(&self, member: &MethodIdentity) -> bool {
        if is_excluded(member, self.metadata()) {
            trace!(policy = self.name(), method = %member, "excluded by no-policies marker");
            return false;
        }
        self.matches(member)
    }

    /// Handlers for `member`, in the order they should run. Empty when the
    /// policy does not apply.
    fn handlers_for(
        &self,
        member: &MethodIdentity,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Vec<Arc<dyn Interceptor>>> {
        if !self.applies_to(member) {
            return Ok(Vec::new());
        }
        self.resolve_handlers(member, resolver, context)
    }
}

/// Whether a no-policies marker decorates the interface method, the
/// implementation method, or either declaring type.
pub fn is_excluded(member: &MethodIdentity, metadata: &dyn MetadataSource) -> bool {
    member.methods().any(|m| method_excluded(m, metadata))
}

fn method_excluded(method: &MethodSignature, metadata: &dyn MetadataSource) -> bool {
    metadata
        .method_attributes(method, true)
        .iter()
        .chain(metadata.type_attributes(method.declaring_type(), true).iter())
        .any(intercept_core::Attribute::is_no_policies)
}
