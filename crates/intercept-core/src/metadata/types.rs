//! Type descriptions.

use std::fmt;
use std::sync::Arc;

use super::{AssemblyName, Attribute, MethodDecl, MethodSignature, TypeRef};

/// Whether a type is a concrete class or an interface contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Concrete type with implementations.
    Class,
    /// Contract with method declarations only.
    Interface,
}

/// Immutable description of one type.
///
/// Built once through [`TypeInfoBuilder`] and shared as `Arc<TypeInfo>`.
/// Two descriptions denote the same type when their full name and assembly
/// short name agree.
pub struct TypeInfo {
    name: TypeRef,
    assembly: AssemblyName,
    kind: TypeKind,
    sealed: bool,
    base: Option<Arc<TypeInfo>>,
    interfaces: Vec<Arc<TypeInfo>>,
    attributes: Vec<Attribute>,
    methods: Vec<MethodDecl>,
}

impl TypeInfo {
    /// Start describing a class.
    #[must_use]
    pub fn class(full_name: &str, assembly: AssemblyName) -> TypeInfoBuilder {
        TypeInfoBuilder::new(full_name, assembly, TypeKind::Class)
    }

    /// Start describing an interface.
    #[must_use]
    pub fn interface(full_name: &str, assembly: AssemblyName) -> TypeInfoBuilder {
        TypeInfoBuilder::new(full_name, assembly, TypeKind::Interface)
    }

    /// Namespace-qualified type reference.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.name
    }

    /// Simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.name()
    }

    /// Namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    /// Dotted full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    /// Defining assembly.
    #[must_use]
    pub fn assembly(&self) -> &AssemblyName {
        &self.assembly
    }

    /// Class or interface.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether the type is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Whether the type forbids derivation.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Base class, if any.
    #[must_use]
    pub fn base_type(&self) -> Option<&Arc<TypeInfo>> {
        self.base.as_ref()
    }

    /// Directly declared interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[Arc<TypeInfo>] {
        &self.interfaces
    }

    /// Attributes declared directly on this type.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Declared attributes followed, when `inherit` is set, by the
    /// inheritable attributes of each base class, nearest first.
    #[must_use]
    pub fn attributes_with_inherited(&self, inherit: bool) -> Vec<Attribute> {
        let mut attributes = self.attributes.clone();
        if inherit {
            let mut current = self.base.as_ref();
            while let Some(base) = current {
                attributes.extend(base.attributes.iter().filter(|a| a.is_inherited()).cloned());
                current = base.base.as_ref();
            }
        }
        attributes
    }

    /// Whether two descriptions denote the same type.
    #[must_use]
    pub fn same_type(&self, other: &TypeInfo) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name && self.assembly.name() == other.assembly.name())
    }

    /// Whether this type is `contract` or derives from / implements it.
    #[must_use]
    pub fn is_assignable_to(&self, contract: &TypeInfo) -> bool {
        if self.same_type(contract) {
            return true;
        }
        if self
            .interfaces
            .iter()
            .any(|iface| iface.is_assignable_to(contract))
        {
            return true;
        }
        self.base
            .as_ref()
            .is_some_and(|base| base.is_assignable_to(contract))
    }

    /// Number of methods declared directly on this type.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub(crate) fn decl(&self, index: usize) -> &MethodDecl {
        &self.methods[index]
    }

    /// All methods declared directly on this type, in declaration order.
    #[must_use]
    pub fn methods(self: &Arc<Self>) -> Vec<MethodSignature> {
        (0..self.methods.len())
            .map(|index| MethodSignature::new(Arc::clone(self), index))
            .collect()
    }

    /// First method with the given name declared on this type or, failing
    /// that, on a base class.
    #[must_use]
    pub fn method(self: &Arc<Self>, name: &str) -> Option<MethodSignature> {
        if let Some(index) = self.methods.iter().position(|m| m.name == name) {
            return Some(MethodSignature::new(Arc::clone(self), index));
        }
        self.base.as_ref().and_then(|base| base.method(name))
    }

    /// Method with the given name and parameter types, searching base
    /// classes when it is not declared here.
    #[must_use]
    pub fn find_method(self: &Arc<Self>, name: &str, parameter_types: &[TypeRef]) -> Option<MethodSignature> {
        let position = self.methods.iter().position(|m| {
            m.name == name
                && m.parameters.len() == parameter_types.len()
                && m.parameters
                    .iter()
                    .zip(parameter_types)
                    .all(|(p, t)| &p.type_ref == t)
        });
        if let Some(index) = position {
            return Some(MethodSignature::new(Arc::clone(self), index));
        }
        self.base
            .as_ref()
            .and_then(|base| base.find_method(name, parameter_types))
    }

    /// Every method callable on an instance: this type's own declarations
    /// followed by base-class declarations it does not redeclare.
    #[must_use]
    pub fn all_methods(self: &Arc<Self>) -> Vec<MethodSignature> {
        let mut methods = self.methods();
        let mut current = self.base.clone();
        while let Some(base) = current {
            for inherited in base.methods() {
                let hidden = methods
                    .iter()
                    .any(|m| m.name() == inherited.name() && m.has_same_parameters(&inherited));
                if !hidden {
                    methods.push(inherited);
                }
            }
            current = base.base.clone();
        }
        methods
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name.full_name())
            .field("assembly", &self.assembly.name())
            .field("kind", &self.kind)
            .field("method_count", &self.methods.len())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for [`TypeInfo`].
#[derive(Debug)]
pub struct TypeInfoBuilder {
    name: TypeRef,
    assembly: AssemblyName,
    kind: TypeKind,
    sealed: bool,
    base: Option<Arc<TypeInfo>>,
    interfaces: Vec<Arc<TypeInfo>>,
    attributes: Vec<Attribute>,
    methods: Vec<MethodDecl>,
}

impl TypeInfoBuilder {
    fn new(full_name: &str, assembly: AssemblyName, kind: TypeKind) -> Self {
        Self {
            name: TypeRef::parse(full_name),
            assembly,
            kind,
            sealed: false,
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Forbid derivation.
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Set the base class.
    #[must_use]
    pub fn base(mut self, base: Arc<TypeInfo>) -> Self {
        self.base = Some(base);
        self
    }

    /// Declare an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: Arc<TypeInfo>) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Attach a type-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a method.
    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Finish the description.
    #[must_use]
    pub fn build(self) -> Arc<TypeInfo> {
        Arc::new(TypeInfo {
            name: self.name,
            assembly: self.assembly,
            kind: self.kind,
            sealed: self.sealed,
            base: self.base,
            interfaces: self.interfaces,
            attributes: self.attributes,
            methods: self.methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_types() -> (Arc<TypeInfo>, Arc<TypeInfo>, Arc<TypeInfo>) {
        let contract = TypeInfo::interface("Bank.IAccount", AssemblyName::new("Bank"))
            .method(MethodDecl::new("Deposit").param("amount", "System.Decimal"))
            .build();
        let base = TypeInfo::class("Bank.AccountBase", AssemblyName::new("Bank"))
            .attribute(Attribute::tag("base"))
            .attribute(Attribute::tag("private").not_inherited())
            .method(MethodDecl::new("Audit"))
            .build();
        let account = TypeInfo::class("Bank.Account", AssemblyName::new("Bank"))
            .base(Arc::clone(&base))
            .implements(Arc::clone(&contract))
            .method(MethodDecl::new("Deposit").param("amount", "System.Decimal"))
            .method(MethodDecl::new("Withdraw").param("amount", "System.Decimal"))
            .build();
        (contract, base, account)
    }

    #[test]
    fn assignability_follows_interfaces_and_bases() {
        let (contract, base, account) = account_types();
        assert!(account.is_assignable_to(&contract));
        assert!(account.is_assignable_to(&base));
        assert!(!base.is_assignable_to(&contract));
    }

    #[test]
    fn inherited_attributes_respect_flag() {
        let (_, _, account) = account_types();
        assert!(account.attributes_with_inherited(false).is_empty());
        let inherited = account.attributes_with_inherited(true);
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].as_tag(), Some("base"));
    }

    #[test]
    fn method_lookup_searches_bases() {
        let (_, _, account) = account_types();
        assert_eq!(account.method("Withdraw").unwrap().name(), "Withdraw");
        let audit = account.method("Audit").unwrap();
        assert_eq!(audit.declaring_type().name(), "AccountBase");
        assert!(account.method("Missing").is_none());
    }

    #[test]
    fn all_methods_includes_unhidden_base_methods() {
        let (_, _, account) = account_types();
        let names: Vec<String> = account
            .all_methods()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["Deposit", "Withdraw", "Audit"]);
    }

    #[test]
    fn find_method_compares_parameter_types() {
        let (_, _, account) = account_types();
        assert!(
            account
                .find_method("Deposit", &[TypeRef::parse("System.Decimal")])
                .is_some()
        );
        assert!(
            account
                .find_method("Deposit", &[TypeRef::parse("System.Int32")])
                .is_none()
        );
    }

    #[test]
    fn same_type_compares_name_and_assembly() {
        let a = TypeInfo::class("Bank.Account", AssemblyName::new("Bank")).build();
        let b = TypeInfo::class("Bank.Account", AssemblyName::new("Bank").with_version("2.0"))
            .build();
        let c = TypeInfo::class("Bank.Account", AssemblyName::new("Other")).build();
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
    }
}
