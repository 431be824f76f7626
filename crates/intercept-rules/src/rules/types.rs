//! Type-shaped rules: return type, parameter signature, parameter types, and
//! declaring type.

use intercept_core::{MethodSignature, TypeInfo, TypeRef};
use serde::{Deserialize, Serialize};

/// Compare a configured type name with an actual one.
///
/// With `ignore_namespace`, or when the configured name carries no namespace,
/// only simple names are compared.
fn same_type_name(expected: &TypeRef, actual: &TypeRef, ignore_namespace: bool, ignore_case: bool) -> bool {
    let eq = |a: &str, b: &str| {
        if ignore_case {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };
    if ignore_namespace || expected.namespace().is_none() {
        eq(expected.name(), actual.name())
    } else {
        eq(&expected.full_name(), &actual.full_name())
    }
}

/// Matches the method's return type.
///
/// Constructors have no return type and only match the `void` sentinel.
#[derive(Debug, Clone)]
pub struct ReturnTypeRule {
    expected: TypeRef,
    ignore_namespace: bool,
}

impl ReturnTypeRule {
    /// Match against a full type name.
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self::with_options(type_name, false)
    }

    /// Match against a type name, optionally comparing simple names only.
    #[must_use]
    pub fn with_options(type_name: &str, ignore_namespace: bool) -> Self {
        Self {
            expected: TypeRef::parse(type_name),
            ignore_namespace,
        }
    }

    /// Whether the method returns the configured type.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        match method.return_type() {
            None => self.expected.is_void(),
            Some(actual) if self.expected.is_void() => actual.is_void(),
            Some(actual) => same_type_name(&self.expected, actual, self.ignore_namespace, false),
        }
    }
}

/// Matches methods whose parameter types equal a list, position by position.
#[derive(Debug, Clone)]
pub struct SignatureRule {
    parameter_types: Vec<TypeRef>,
}

impl SignatureRule {
    /// Build from full type names in parameter order.
    pub fn new<'a>(parameter_types: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            parameter_types: parameter_types.into_iter().map(TypeRef::parse).collect(),
        }
    }

    /// Whether the parameter count and every parameter type match exactly.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        let parameters = method.parameters();
        parameters.len() == self.parameter_types.len()
            && parameters
                .iter()
                .zip(&self.parameter_types)
                .all(|(p, t)| p.type_ref().full_name() == t.full_name())
    }
}

/// Where a [`ParameterTypeMatch`] looks for its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    /// Parameters passed in (`in` or by-ref).
    #[default]
    Input,
    /// Parameters passed out (by-ref or `out`).
    Output,
    /// Any parameter.
    InputOrOutput,
    /// The return value.
    Return,
}

/// One entry of a [`ParameterTypeRule`].
#[derive(Debug, Clone)]
pub struct ParameterTypeMatch {
    type_name: TypeRef,
    kind: ParameterKind,
    ignore_case: bool,
}

impl ParameterTypeMatch {
    /// Match `type_name` at the positions `kind` selects.
    #[must_use]
    pub fn new(type_name: &str, kind: ParameterKind) -> Self {
        Self {
            type_name: TypeRef::parse(type_name),
            kind,
            ignore_case: false,
        }
    }

    /// Compare names case-insensitively.
    #[must_use]
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    fn matches(&self, method: &MethodSignature) -> bool {
        let same = |actual: &TypeRef| same_type_name(&self.type_name, actual, false, self.ignore_case);
        match self.kind {
            ParameterKind::Return => method.return_type().is_some_and(same),
            ParameterKind::Input => method
                .parameters()
                .iter()
                .any(|p| p.direction().is_input() && same(p.type_ref())),
            ParameterKind::Output => method
                .parameters()
                .iter()
                .any(|p| p.direction().is_output() && same(p.type_ref())),
            ParameterKind::InputOrOutput => method.parameters().iter().any(|p| same(p.type_ref())),
        }
    }
}

/// Matches when any listed parameter (or return) type is present.
#[derive(Debug, Clone)]
pub struct ParameterTypeRule {
    matches: Vec<ParameterTypeMatch>,
}

impl ParameterTypeRule {
    /// Build from a list of entries.
    pub fn new(matches: impl IntoIterator<Item = ParameterTypeMatch>) -> Self {
        Self {
            matches: matches.into_iter().collect(),
        }
    }

    /// Whether any entry matches.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        self.matches.iter().any(|m| m.matches(method))
    }
}

/// Matches methods declared on one exact type. Subtypes do not match.
#[derive(Debug, Clone)]
pub struct TypeRule {
    type_name: TypeRef,
    ignore_case: bool,
}

impl TypeRule {
    /// Match the given type by full name.
    #[must_use]
    pub fn for_type(target: &TypeInfo) -> Self {
        Self {
            type_name: target.type_ref().clone(),
            ignore_case: false,
        }
    }

    /// Match by name. A name without a namespace compares simple names.
    #[must_use]
    pub fn named(type_name: &str, ignore_case: bool) -> Self {
        Self {
            type_name: TypeRef::parse(type_name),
            ignore_case,
        }
    }

    /// Whether the declaring type is the configured type.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        same_type_name(
            &self.type_name,
            method.declaring_type().type_ref(),
            false,
            self.ignore_case,
        )
    }
}
