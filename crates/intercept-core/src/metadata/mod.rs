//! Metadata model for intercepted code.
//!
//! Rust has no runtime reflection, so intercepted types describe themselves
//! with these values: a [`TypeInfo`] per type (built once and shared through
//! `Arc`), a [`MethodSignature`] per method, and [`Attribute`]s as the
//! decorator metadata consulted by policies and rules.
//!
//! Names follow the dotted `Namespace.Type` convention; assemblies are the
//! defining module of a type and are identified by an [`AssemblyName`].

mod attributes;
mod method;
mod types;

pub use attributes::{Attribute, AttributeKind, HandlerDescriptor};
pub use method::{MethodDecl, MethodKind, MethodSignature, ParameterDirection, ParameterInfo};
pub use types::{TypeInfo, TypeInfoBuilder, TypeKind};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{InterceptError, Result};

/// Reference to a type by namespace and simple name.
///
/// Serializes as its dotted full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeRef {
    namespace: Option<String>,
    name: String,
}

impl TypeRef {
    /// Create a reference from explicit parts.
    #[must_use]
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(ToString::to_string),
            name: name.into(),
        }
    }

    /// Split a dotted full name at its last `.`.
    ///
    /// `"System.String"` has namespace `System`; `"int"` has none.
    #[must_use]
    pub fn parse(full_name: &str) -> Self {
        let full_name = full_name.trim();
        match full_name.rsplit_once('.') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Self::new(Some(ns), name),
            _ => Self::new(None, full_name),
        }
    }

    /// The `System.Void` sentinel used for methods without a return value.
    #[must_use]
    pub fn void() -> Self {
        Self::new(Some("System"), "Void")
    }

    /// Whether this names the void sentinel (`void` or `System.Void`).
    #[must_use]
    pub fn is_void(&self) -> bool {
        match &self.namespace {
            None => self.name.eq_ignore_ascii_case("void"),
            Some(ns) => ns == "System" && self.name == "Void",
        }
    }

    /// Simple name without namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Dotted full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(full_name: &str) -> Self {
        Self::parse(full_name)
    }
}

impl From<String> for TypeRef {
    fn from(full_name: String) -> Self {
        Self::parse(&full_name)
    }
}

impl From<TypeRef> for String {
    fn from(type_ref: TypeRef) -> Self {
        type_ref.full_name()
    }
}

/// Identity of the module that defines a type.
///
/// Display form: `Name[, Version=a.b.c.d][, Culture=x][, PublicKeyToken=hex]`.
/// Serializes as the display form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssemblyName {
    name: String,
    version: Option<String>,
    culture: Option<String>,
    public_key_token: Option<String>,
}

impl AssemblyName {
    /// Create a name-only identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            culture: None,
            public_key_token: None,
        }
    }

    /// Set the version component.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the culture component.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Set the public key token component.
    #[must_use]
    pub fn with_public_key_token(mut self, token: impl Into<String>) -> Self {
        self.public_key_token = Some(token.into());
        self
    }

    /// Parse a display name such as
    /// `mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089`.
    ///
    /// Unrecognised `key=value` components are ignored; a component without
    /// `=`, an empty name, or a malformed version is an error.
    pub fn parse(display: &str) -> Result<Self> {
        let mut parts = display.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() || name.contains('=') {
            return Err(InterceptError::InvalidAssemblyName(display.to_string()));
        }

        let mut parsed = Self::new(name);
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(InterceptError::InvalidAssemblyName(display.to_string()));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    if !is_valid_version(value) {
                        return Err(InterceptError::InvalidAssemblyName(display.to_string()));
                    }
                    parsed.version = Some(value.to_string());
                }
                "culture" => parsed.culture = Some(value.to_string()),
                "publickeytoken" => parsed.public_key_token = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(parsed)
    }

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version component, if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Culture component, if present.
    #[must_use]
    pub fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }

    /// Public key token component, if present.
    #[must_use]
    pub fn public_key_token(&self) -> Option<&str> {
        self.public_key_token.as_deref()
    }

    /// Whether any component beyond the short name is specified.
    #[must_use]
    pub fn is_full_identity(&self) -> bool {
        self.version.is_some() || self.culture.is_some() || self.public_key_token.is_some()
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, ", Version={version}")?;
        }
        if let Some(culture) = &self.culture {
            write!(f, ", Culture={culture}")?;
        }
        if let Some(token) = &self.public_key_token {
            write!(f, ", PublicKeyToken={token}")?;
        }
        Ok(())
    }
}

impl FromStr for AssemblyName {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssemblyName {
    type Error = InterceptError;

    fn try_from(display: String) -> Result<Self> {
        Self::parse(&display)
    }
}

impl From<AssemblyName> for String {
    fn from(assembly: AssemblyName) -> Self {
        assembly.to_string()
    }
}

fn is_valid_version(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    (2..=4).contains(&parts.len()) && parts.iter().all(|p| p.parse::<u16>().is_ok())
}
