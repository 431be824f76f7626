//! Proxy strategies and the intercepting proxy.
//!
//! How a proxy physically intercepts calls is outside this crate. A
//! [`ProxyFactory`] only decides which methods of a type pair can be
//! intercepted; [`InterceptingProxy`] drives calls through the behavior
//! pipeline and reaches the real object through [`Dispatch`].

mod interface;
mod intercepting;
mod virtual_method;

pub use interface::InterfaceProxyFactory;
pub use intercepting::InterceptingProxy;
pub use virtual_method::VirtualMethodProxyFactory;

use std::sync::Arc;

use intercept_core::{MethodIdentity, MethodSignature, TypeInfo};
use serde_json::Value;

use crate::errors::Result;

/// An object whose methods can be called by signature.
///
/// `arguments` is aligned with the method's parameters. Implementations
/// write by-ref and out values back into it.
pub trait Dispatch: Send + Sync {
    /// Runtime type of the object.
    fn type_info(&self) -> Arc<TypeInfo>;

    /// Execute `method` on this object.
    fn invoke(&self, method: &MethodSignature, arguments: &mut [Value]) -> anyhow::Result<Option<Value>>;
}

/// How a proxy strategy substitutes for the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    /// Wraps an existing instance.
    Instance,
    /// Produces a substitutable derived type.
    Type,
}

/// A proxy strategy.
pub trait ProxyFactory: Send + Sync {
    /// Name passed to resolvers as the driving interceptor.
    fn name(&self) -> &str;

    /// Instance or type proxying.
    fn kind(&self) -> ProxyKind;

    /// Whether this strategy can intercept `ty` at all.
    fn can_intercept(&self, ty: &TypeInfo) -> bool;

    /// Identities of every method intercepted when `implementation` is
    /// reached through `contract`.
    fn interceptable_methods(
        &self,
        contract: &Arc<TypeInfo>,
        implementation: &Arc<TypeInfo>,
    ) -> Result<Vec<MethodIdentity>>;
}
