//! # intercept-core
//!
//! Foundation types shared by every crate of the interception engine.
//!
//! - **Metadata**: [`TypeInfo`], [`MethodSignature`], [`ParameterInfo`] and
//!   [`Attribute`] describe intercepted code without runtime reflection
//! - **Identity**: [`MethodIdentity`] pairs an optional interface method with
//!   its implementing method and is the unit of policy matching
//! - **Call model**: [`CallInvocation`] and [`CallResult`] carry one
//!   intercepted call through a pipeline, sharing an [`InvocationContext`]
//! - **Errors**: [`InterceptError`] for configuration failures raised at
//!   construction time
//! - **Logging**: `tracing` subscriber bootstrap and a capture layer for tests

#![deny(unsafe_code)]

pub mod call;
pub mod errors;
pub mod identity;
pub mod logging;
pub mod metadata;

pub use call::{
    CallException, CallInvocation, CallResult, InvocationContext, ParameterView,
    ParameterViewMut,
};
pub use errors::{InterceptError, Result};
pub use identity::MethodIdentity;
pub use metadata::{
    AssemblyName, Attribute, AttributeKind, HandlerDescriptor, MethodDecl, MethodKind,
    MethodSignature, ParameterDirection, ParameterInfo, TypeInfo, TypeInfoBuilder, TypeKind,
    TypeRef,
};

/// Argument and return values flowing through a call.
pub use serde_json::Value;
