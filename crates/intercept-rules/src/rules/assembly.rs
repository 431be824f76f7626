//! Assembly rule: matches on the declaring type's defining module.

use intercept_core::{AssemblyName, MethodSignature};

use crate::errors::Result;

/// Matches methods whose declaring type lives in a given assembly.
///
/// A name-only identity compares short names and ignores every other
/// component. A full identity additionally requires each component it
/// specifies to equal the actual one.
#[derive(Debug, Clone)]
pub struct AssemblyRule {
    assembly: AssemblyName,
}

impl AssemblyRule {
    /// Parse an assembly display name.
    pub fn new(display_name: &str) -> Result<Self> {
        Ok(Self {
            assembly: AssemblyName::parse(display_name)?,
        })
    }

    /// Rule over an already parsed identity.
    #[must_use]
    pub fn from_name(assembly: AssemblyName) -> Self {
        Self { assembly }
    }

    /// Configured identity.
    #[must_use]
    pub fn assembly(&self) -> &AssemblyName {
        &self.assembly
    }

    /// Whether the declaring type's assembly satisfies the configured identity.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        let actual = method.declaring_type().assembly();
        if !self.assembly.name().eq_ignore_ascii_case(actual.name()) {
            return false;
        }
        if !self.assembly.is_full_identity() {
            return true;
        }
        let version_ok = self
            .assembly
            .version()
            .is_none_or(|v| actual.version() == Some(v));
        let culture_ok = self.assembly.culture().is_none_or(|c| {
            c.eq_ignore_ascii_case(actual.culture().unwrap_or("neutral"))
        });
        let token_ok = self.assembly.public_key_token().is_none_or(|t| {
            actual
                .public_key_token()
                .is_some_and(|a| a.eq_ignore_ascii_case(t))
        });
        version_ok && culture_ok && token_ok
    }
}
