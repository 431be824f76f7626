//! Method identity: the unit of policy matching.

use std::fmt;

use crate::errors::{InterceptError, Result};
use crate::metadata::MethodSignature;

/// Pairs the interface method a call was reached through (if any) with the
/// concrete implementing method.
///
/// Immutable, with structural equality and hashing over both fields.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    interface_method: Option<MethodSignature>,
    implementation_method: MethodSignature,
}

impl MethodIdentity {
    /// Identity for a call made directly on the implementation.
    #[must_use]
    pub fn for_implementation(implementation_method: MethodSignature) -> Self {
        Self {
            interface_method: None,
            implementation_method,
        }
    }

    /// Identity for a call reached through an interface contract.
    ///
    /// Fails when `interface_method` is not declared on an interface.
    pub fn through_interface(
        interface_method: MethodSignature,
        implementation_method: MethodSignature,
    ) -> Result<Self> {
        if !interface_method.declaring_type().is_interface() {
            return Err(InterceptError::NotAnInterface {
                type_name: interface_method.declaring_type().full_name(),
            });
        }
        Ok(Self {
            interface_method: Some(interface_method),
            implementation_method,
        })
    }

    /// Interface method, when the call came through a contract.
    #[must_use]
    pub fn interface_method(&self) -> Option<&MethodSignature> {
        self.interface_method.as_ref()
    }

    /// Concrete implementing method. Always present.
    #[must_use]
    pub fn implementation_method(&self) -> &MethodSignature {
        &self.implementation_method
    }

    /// Both views of the call: interface first when present.
    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.interface_method
            .iter()
            .chain(std::iter::once(&self.implementation_method))
    }
}

impl fmt::Debug for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodIdentity")
            .field("interface", &self.interface_method)
            .field("implementation", &self.implementation_method)
            .finish()
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interface_method {
            Some(iface) => write!(f, "{iface} -> {}", self.implementation_method),
            None => write!(f, "{}", self.implementation_method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AssemblyName, MethodDecl, TypeInfo};
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn types() -> (Arc<TypeInfo>, Arc<TypeInfo>) {
        let contract = TypeInfo::interface("Bank.IAccount", AssemblyName::new("Bank"))
            .method(MethodDecl::new("Deposit").param("amount", "System.Decimal"))
            .build();
        let account = TypeInfo::class("Bank.Account", AssemblyName::new("Bank"))
            .implements(Arc::clone(&contract))
            .method(MethodDecl::new("Deposit").param("amount", "System.Decimal"))
            .build();
        (contract, account)
    }

    #[test]
    fn through_interface_requires_interface() {
        let (contract, account) = types();
        let deposit = account.method("Deposit").unwrap();
        assert!(
            MethodIdentity::through_interface(contract.method("Deposit").unwrap(), deposit.clone())
                .is_ok()
        );
        assert_matches!(
            MethodIdentity::through_interface(deposit.clone(), deposit),
            Err(InterceptError::NotAnInterface { .. })
        );
    }

    #[test]
    fn identities_are_map_keys() {
        let (contract, account) = types();
        let direct = MethodIdentity::for_implementation(account.method("Deposit").unwrap());
        let via = MethodIdentity::through_interface(
            contract.method("Deposit").unwrap(),
            account.method("Deposit").unwrap(),
        )
        .unwrap();

        let mut map = HashMap::new();
        let _ = map.insert(direct.clone(), 1);
        let _ = map.insert(via.clone(), 2);
        let _ = map.insert(
            MethodIdentity::for_implementation(account.method("Deposit").unwrap()),
            3,
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map[&direct], 3);
        assert_eq!(map[&via], 2);
    }

    #[test]
    fn methods_yields_interface_first() {
        let (contract, account) = types();
        let via = MethodIdentity::through_interface(
            contract.method("Deposit").unwrap(),
            account.method("Deposit").unwrap(),
        )
        .unwrap();
        let owners: Vec<String> = via
            .methods()
            .map(|m| m.declaring_type().name().to_string())
            .collect();
        assert_eq!(owners, vec!["IAccount", "Account"]);
    }
}
