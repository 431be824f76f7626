//! Handler references and their resolution.
//!
//! Policies hold handlers either as ready instances or as `(type, name)`
//! references. References are turned into instances by an
//! [`InterceptorResolver`], which is told through a [`ResolutionContext`]
//! which interceptor and which type pair triggered the build.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use intercept_core::{CallInvocation, CallResult, HandlerDescriptor, TypeInfo};
use intercept_pipeline::{Interceptor, Next};
use tracing::debug;

use crate::errors::{PolicyError, Result};

/// What a handler reference is being resolved for.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Name of the interceptor (proxy strategy or behavior) driving the build.
    pub interceptor: Option<String>,
    /// Type the caller sees.
    pub contract: Option<Arc<TypeInfo>>,
    /// Concrete type being intercepted.
    pub implementation: Option<Arc<TypeInfo>>,
}

impl ResolutionContext {
    /// Context for intercepting `implementation` through `contract`.
    #[must_use]
    pub fn new(contract: Arc<TypeInfo>, implementation: Arc<TypeInfo>) -> Self {
        Self {
            interceptor: None,
            contract: Some(contract),
            implementation: Some(implementation),
        }
    }

    /// Record the driving interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: impl Into<String>) -> Self {
        self.interceptor = Some(interceptor.into());
        self
    }
}

/// Turns handler references into instances.
pub trait InterceptorResolver: Send + Sync {
    /// Resolve the handler `descriptor` names.
    fn resolve(
        &self,
        descriptor: &HandlerDescriptor,
        context: &ResolutionContext,
    ) -> Result<Arc<dyn Interceptor>>;
}

/// A handler held by a policy or attached to a proxy.
#[derive(Clone)]
pub enum InterceptorRef {
    /// A ready instance.
    Instance(Arc<dyn Interceptor>),
    /// A reference resolved when a pipeline is built.
    Resolve(HandlerDescriptor),
}

impl InterceptorRef {
    /// Reference by registered type name.
    #[must_use]
    pub fn by_type(type_name: impl Into<String>) -> Self {
        Self::Resolve(HandlerDescriptor::new(type_name))
    }

    /// Reference by registered type name and registration name.
    #[must_use]
    pub fn named(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Resolve(HandlerDescriptor::new(type_name).named(name))
    }

    /// Produce the instance, resolving through `resolver` if needed.
    pub fn resolve(
        &self,
        resolver: &dyn InterceptorResolver,
        context: &ResolutionContext,
    ) -> Result<Arc<dyn Interceptor>> {
        match self {
            Self::Instance(unit) => Ok(Arc::clone(unit)),
            Self::Resolve(descriptor) => resolver.resolve(descriptor, context),
        }
    }
}

impl From<Arc<dyn Interceptor>> for InterceptorRef {
    fn from(unit: Arc<dyn Interceptor>) -> Self {
        Self::Instance(unit)
    }
}

impl fmt::Debug for InterceptorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(unit) => f.debug_tuple("Instance").field(&unit.name()).finish(),
            Self::Resolve(descriptor) => f.debug_tuple("Resolve").field(descriptor).finish(),
        }
    }
}

type Factory =
    dyn Fn(&HandlerDescriptor, &ResolutionContext) -> Result<Arc<dyn Interceptor>> + Send + Sync;

/// Keyed interceptor factories.
///
/// Registrations are keyed by type name and optional registration name. An
/// unnamed lookup only finds the unnamed registration; a named lookup only
/// finds that name. Populate the registry before building pipelines.
#[derive(Default)]
pub struct InterceptorRegistry {
    factories: HashMap<(String, Option<String>), Arc<Factory>>,
}

impl InterceptorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the unnamed factory for `type_name`, replacing any previous one.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn(&HandlerDescriptor, &ResolutionContext) -> Result<Arc<dyn Interceptor>>
        + Send
        + Sync
        + 'static,
    ) {
        self.insert(type_name.into(), None, Arc::new(factory));
    }

    /// Register a named factory for `type_name`.
    pub fn register_named(
        &mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        factory: impl Fn(&HandlerDescriptor, &ResolutionContext) -> Result<Arc<dyn Interceptor>>
        + Send
        + Sync
        + 'static,
    ) {
        self.insert(type_name.into(), Some(name.into()), Arc::new(factory));
    }

    /// Register a shared instance returned for every unnamed lookup of `type_name`.
    pub fn register_instance(&mut self, type_name: impl Into<String>, unit: Arc<dyn Interceptor>) {
        self.insert(
            type_name.into(),
            None,
            Arc::new(
                move |_: &HandlerDescriptor, _: &ResolutionContext| -> Result<Arc<dyn Interceptor>> {
                    Ok(Arc::clone(&unit))
                },
            ),
        );
    }

    fn insert(&mut self, type_name: String, name: Option<String>, factory: Arc<Factory>) {
        debug!(type_name = %type_name, name = ?name, "registering interceptor factory");
        let _ = self.factories.insert((type_name, name), factory);
    }

    /// Whether a registration exists for the key.
    #[must_use]
    pub fn contains(&self, type_name: &str, name: Option<&str>) -> bool {
        self.factories
            .contains_key(&(type_name.to_string(), name.map(ToString::to_string)))
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl InterceptorResolver for InterceptorRegistry {
    fn resolve(
        &self,
        descriptor: &HandlerDescriptor,
        context: &ResolutionContext,
    ) -> Result<Arc<dyn Interceptor>> {
        let key = (descriptor.type_name.clone(), descriptor.name.clone());
        let factory = self.factories.get(&key).ok_or_else(|| PolicyError::Unresolved {
            type_name: descriptor.type_name.clone(),
            name: descriptor.name.clone(),
        })?;
        let unit = factory(descriptor, context)?;
        debug!(
            type_name = %descriptor.type_name,
            unit = unit.name(),
            interceptor = ?context.interceptor,
            "resolved interceptor"
        );
        Ok(with_order(unit, descriptor.order))
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("registrations", &self.factories.len())
            .finish()
    }
}

/// Apply a declared order to a resolved unit. `0` keeps the unit's own order.
pub(crate) fn with_order(unit: Arc<dyn Interceptor>, order: i32) -> Arc<dyn Interceptor> {
    if order == 0 || unit.order() == order {
        return unit;
    }
    Arc::new(Ordered { inner: unit, order })
}

struct Ordered {
    inner: Arc<dyn Interceptor>,
    order: i32,
}

impl Interceptor for Ordered {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn will_execute(&self) -> bool {
        self.inner.will_execute()
    }

    fn required_interfaces(&self) -> Vec<Arc<TypeInfo>> {
        self.inner.required_interfaces()
    }

    fn wrapped(&self) -> Option<&dyn Interceptor> {
        Some(self.inner.as_ref())
    }

    fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
        self.inner.invoke(call, next)
    }
}
