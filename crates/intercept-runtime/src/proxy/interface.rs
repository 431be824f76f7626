//! Interface proxying.

use std::sync::Arc;

use intercept_core::{InterceptError, MethodIdentity, TypeInfo, TypeRef};
use tracing::debug;

use super::{ProxyFactory, ProxyKind};
use crate::errors::Result;

/// Intercepts calls made through an interface contract on an existing
/// instance.
///
/// Every contract method, including those of inherited interfaces, maps to
/// the implementation method with the same name and parameter types.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceProxyFactory;

impl InterfaceProxyFactory {
    /// Create the factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// `contract` followed by its inherited interfaces, depth first, without
/// repeats.
fn contract_types(contract: &Arc<TypeInfo>) -> Vec<Arc<TypeInfo>> {
    let mut seen: Vec<Arc<TypeInfo>> = Vec::new();
    let mut pending = vec![Arc::clone(contract)];
    while let Some(ty) = pending.pop() {
        if seen.iter().any(|s| s.same_type(&ty)) {
            continue;
        }
        pending.extend(ty.interfaces().iter().rev().cloned());
        seen.push(ty);
    }
    seen
}

impl ProxyFactory for InterfaceProxyFactory {
    fn name(&self) -> &str {
        "interface"
    }

    fn kind(&self) -> ProxyKind {
        ProxyKind::Instance
    }

    fn can_intercept(&self, ty: &TypeInfo) -> bool {
        ty.is_interface()
    }

    fn interceptable_methods(
        &self,
        contract: &Arc<TypeInfo>,
        implementation: &Arc<TypeInfo>,
    ) -> Result<Vec<MethodIdentity>> {
        if !contract.is_interface() {
            return Err(InterceptError::NotAnInterface {
                type_name: contract.full_name(),
            }
            .into());
        }
        if !implementation.is_assignable_to(contract) {
            return Err(InterceptError::NotAssignable {
                contract: contract.full_name(),
                implementation: implementation.full_name(),
            }
            .into());
        }

        let mut identities = Vec::new();
        for ty in contract_types(contract) {
            for interface_method in ty.methods() {
                let parameter_types: Vec<TypeRef> = interface_method
                    .parameters()
                    .iter()
                    .map(|p| p.type_ref().clone())
                    .collect();
                let implementation_method = implementation
                    .find_method(interface_method.name(), &parameter_types)
                    .ok_or_else(|| InterceptError::UnknownMethod {
                        type_name: implementation.full_name(),
                        method: interface_method.name().to_string(),
                    })?;
                identities.push(MethodIdentity::through_interface(
                    interface_method,
                    implementation_method,
                )?);
            }
        }
        debug!(
            contract = %contract,
            implementation = %implementation,
            methods = identities.len(),
            "interface methods mapped"
        );
        Ok(identities)
    }
}
