//! Type proxying through overridable methods.

use std::sync::Arc;

use intercept_core::{InterceptError, MethodIdentity, TypeInfo};
use tracing::debug;

use super::{ProxyFactory, ProxyKind};
use crate::errors::{Result, RuntimeError};

/// Intercepts the virtual methods of a class by substituting a derived type.
///
/// Sealed classes and interfaces cannot be intercepted. Identities carry no
/// interface method.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualMethodProxyFactory;

impl VirtualMethodProxyFactory {
    /// Create the factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProxyFactory for VirtualMethodProxyFactory {
    fn name(&self) -> &str {
        "virtual-method"
    }

    fn kind(&self) -> ProxyKind {
        ProxyKind::Type
    }

    fn can_intercept(&self, ty: &TypeInfo) -> bool {
        !ty.is_interface() && !ty.is_sealed()
    }

    fn interceptable_methods(
        &self,
        contract: &Arc<TypeInfo>,
        implementation: &Arc<TypeInfo>,
    ) -> Result<Vec<MethodIdentity>> {
        if !self.can_intercept(implementation) {
            let reason = if implementation.is_interface() {
                "type is an interface"
            } else {
                "type is sealed"
            };
            return Err(RuntimeError::CannotIntercept {
                type_name: implementation.full_name(),
                reason: reason.to_string(),
            });
        }
        if !implementation.is_assignable_to(contract) {
            return Err(InterceptError::NotAssignable {
                contract: contract.full_name(),
                implementation: implementation.full_name(),
            }
            .into());
        }

        let identities: Vec<MethodIdentity> = implementation
            .all_methods()
            .into_iter()
            .filter(|m| m.is_virtual())
            .map(MethodIdentity::for_implementation)
            .collect();
        debug!(
            implementation = %implementation,
            methods = identities.len(),
            "virtual methods collected"
        );
        Ok(identities)
    }
}
