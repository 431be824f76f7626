//! Method and parameter descriptions.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Attribute, TypeInfo, TypeRef};

/// How a parameter passes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    /// Passed by value into the call.
    In,
    /// Passed by reference: read by the callee and written back.
    Ref,
    /// Written by the callee only.
    Out,
}

impl ParameterDirection {
    /// Whether the caller supplies a value (`In` or `Ref`).
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(self, Self::In | Self::Ref)
    }

    /// Whether the callee hands a value back (`Ref` or `Out`).
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(self, Self::Ref | Self::Out)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterInfo {
    pub(crate) name: String,
    pub(crate) type_ref: TypeRef,
    pub(crate) direction: ParameterDirection,
}

impl ParameterInfo {
    /// Describe a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, type_ref: TypeRef, direction: ParameterDirection) -> Self {
        Self {
            name: name.into(),
            type_ref,
            direction,
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter type.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Passing direction.
    #[must_use]
    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }
}

/// What kind of member a method is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Ordinary method.
    Method,
    /// Constructor; has no return type.
    Constructor,
    /// Property getter, named `get_<Property>`.
    PropertyGet,
    /// Property setter, named `set_<Property>`.
    PropertySet,
}

/// Declaration of a method as written on its type.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub(crate) name: String,
    pub(crate) kind: MethodKind,
    pub(crate) parameters: Vec<ParameterInfo>,
    pub(crate) return_type: Option<TypeRef>,
    pub(crate) is_virtual: bool,
    pub(crate) attributes: Vec<Attribute>,
}

impl MethodDecl {
    /// An ordinary method returning `System.Void`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Method,
            parameters: Vec::new(),
            return_type: Some(TypeRef::void()),
            is_virtual: false,
            attributes: Vec::new(),
        }
    }

    /// A constructor.
    #[must_use]
    pub fn constructor() -> Self {
        Self {
            kind: MethodKind::Constructor,
            return_type: None,
            ..Self::new(".ctor")
        }
    }

    /// A property getter returning `property_type`.
    #[must_use]
    pub fn getter(property: &str, property_type: &str) -> Self {
        Self {
            kind: MethodKind::PropertyGet,
            return_type: Some(TypeRef::parse(property_type)),
            ..Self::new(format!("get_{property}"))
        }
    }

    /// A property setter taking a single `value` of `property_type`.
    #[must_use]
    pub fn setter(property: &str, property_type: &str) -> Self {
        Self {
            kind: MethodKind::PropertySet,
            ..Self::new(format!("set_{property}"))
        }
        .param("value", property_type)
    }

    /// Append an input parameter.
    #[must_use]
    pub fn param(self, name: &str, type_name: &str) -> Self {
        self.parameter(ParameterInfo::new(
            name,
            TypeRef::parse(type_name),
            ParameterDirection::In,
        ))
    }

    /// Append a by-reference parameter.
    #[must_use]
    pub fn ref_param(self, name: &str, type_name: &str) -> Self {
        self.parameter(ParameterInfo::new(
            name,
            TypeRef::parse(type_name),
            ParameterDirection::Ref,
        ))
    }

    /// Append an out parameter.
    #[must_use]
    pub fn out_param(self, name: &str, type_name: &str) -> Self {
        self.parameter(ParameterInfo::new(
            name,
            TypeRef::parse(type_name),
            ParameterDirection::Out,
        ))
    }

    /// Append a fully described parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns(mut self, type_name: &str) -> Self {
        self.return_type = Some(TypeRef::parse(type_name));
        self
    }

    /// Mark the method as overridable.
    #[must_use]
    pub fn overridable(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Attach a method-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// A method as seen through its declaring type.
///
/// Cheap to clone. Equality and hashing are structural over the declaring
/// type's identity and the method's declaration slot, so signatures can key
/// maps and deduplicate.
#[derive(Clone)]
pub struct MethodSignature {
    declaring_type: Arc<TypeInfo>,
    index: usize,
}

impl MethodSignature {
    pub(crate) fn new(declaring_type: Arc<TypeInfo>, index: usize) -> Self {
        Self {
            declaring_type,
            index,
        }
    }

    fn decl(&self) -> &MethodDecl {
        self.declaring_type.decl(self.index)
    }

    /// Simple method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.decl().name
    }

    /// `Type.Method` display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.declaring_type.name(), self.name())
    }

    /// Member kind.
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.decl().kind
    }

    /// Declaring type.
    #[must_use]
    pub fn declaring_type(&self) -> &Arc<TypeInfo> {
        &self.declaring_type
    }

    /// Declared parameters in order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.decl().parameters
    }

    /// Return type; `None` for constructors.
    #[must_use]
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.decl().return_type.as_ref()
    }

    /// Whether the method can be overridden.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.decl().is_virtual
    }

    /// Attributes declared directly on the method.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.decl().attributes
    }

    /// Property name for accessor methods.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        match self.kind() {
            MethodKind::PropertyGet => self.name().strip_prefix("get_"),
            MethodKind::PropertySet => self.name().strip_prefix("set_"),
            MethodKind::Method | MethodKind::Constructor => None,
        }
    }

    /// Whether both methods declare the same parameter types in order.
    #[must_use]
    pub fn has_same_parameters(&self, other: &MethodSignature) -> bool {
        let (a, b) = (self.parameters(), other.parameters());
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.type_ref == y.type_ref)
    }

    /// The nearest base-class declaration this method overrides.
    #[must_use]
    pub fn base_declaration(&self) -> Option<MethodSignature> {
        let mut current = self.declaring_type.base_type().cloned();
        while let Some(base) = current {
            if let Some(found) = base
                .methods()
                .into_iter()
                .find(|m| m.name() == self.name() && m.has_same_parameters(self))
            {
                return Some(found);
            }
            current = base.base_type().cloned();
        }
        None
    }

    /// Declared attributes followed, when `inherit` is set, by the
    /// inheritable attributes of each overridden base declaration.
    #[must_use]
    pub fn attributes_with_inherited(&self, inherit: bool) -> Vec<Attribute> {
        let mut attributes = self.attributes().to_vec();
        if inherit {
            let mut current = self.base_declaration();
            while let Some(base) = current {
                attributes.extend(base.attributes().iter().filter(|a| a.is_inherited()).cloned());
                current = base.base_declaration();
            }
        }
        attributes
    }
}

impl PartialEq for MethodSignature {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.declaring_type.same_type(&other.declaring_type)
    }
}

impl Eq for MethodSignature {}

impl Hash for MethodSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.type_ref().hash(state);
        self.declaring_type.assembly().name().hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodSignature")
            .field(&self.display_name())
            .finish()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_type.type_ref(), self.name())?;
        for (i, p) in self.parameters().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p.type_ref)?;
        }
        f.write_str(")")
    }
}
