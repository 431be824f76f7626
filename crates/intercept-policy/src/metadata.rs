//! Decorator metadata queries.

use intercept_core::{Attribute, MethodSignature, TypeInfo};

/// Reports the attributes attached to methods and types.
///
/// Injected into policies so attribute discovery can come from somewhere
/// other than the declared [`TypeInfo`] model (a registry of runtime
/// overrides, for instance).
pub trait MetadataSource: Send + Sync {
    /// Attributes on `method`, plus inheritable ones from overridden base
    /// declarations when `inherit` is set.
    fn method_attributes(&self, method: &MethodSignature, inherit: bool) -> Vec<Attribute>;

    /// Attributes on `ty`, plus inheritable ones from base classes when
    /// `inherit` is set.
    fn type_attributes(&self, ty: &TypeInfo, inherit: bool) -> Vec<Attribute>;
}

/// Reads attributes straight from the declared metadata model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredMetadata;

impl MetadataSource for DeclaredMetadata {
    fn method_attributes(&self, method: &MethodSignature, inherit: bool) -> Vec<Attribute> {
        method.attributes_with_inherited(inherit)
    }

    fn type_attributes(&self, ty: &TypeInfo, inherit: bool) -> Vec<Attribute> {
        ty.attributes_with_inherited(inherit)
    }
}
