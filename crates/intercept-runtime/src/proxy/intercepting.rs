//! The intercepting proxy.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use intercept_core::{
    CallException, CallInvocation, CallResult, InterceptError, MethodIdentity, MethodSignature,
    TypeInfo, TypeRef,
};
use intercept_pipeline::{Interceptor, Pipeline, PipelineManager};
use serde_json::Value;
use tracing::{debug, trace};

use super::{Dispatch, ProxyKind};
use crate::behaviors::executable_pipeline;
use crate::errors::Result;

/// Stands in for a target object and runs every intercepted call through the
/// effective behavior pipeline.
///
/// Pipelines are built per method on first use and reused while
/// `cache_pipelines` is set. Adding a behavior drops every built pipeline.
pub struct InterceptingProxy {
    contract: Arc<TypeInfo>,
    implementation: Arc<TypeInfo>,
    kind: ProxyKind,
    dispatch: Arc<dyn Dispatch>,
    target: Arc<dyn Any + Send + Sync>,
    methods: Vec<MethodIdentity>,
    behaviors: Vec<Arc<dyn Interceptor>>,
    pipelines: PipelineManager,
    cache_pipelines: bool,
}

impl InterceptingProxy {
    pub(crate) fn new<T: Dispatch + 'static>(
        target: Arc<T>,
        contract: Arc<TypeInfo>,
        kind: ProxyKind,
        methods: Vec<MethodIdentity>,
        behaviors: Vec<Arc<dyn Interceptor>>,
    ) -> Self {
        let implementation = target.type_info();
        Self {
            contract,
            implementation,
            kind,
            dispatch: Arc::clone(&target) as Arc<dyn Dispatch>,
            target,
            methods,
            behaviors,
            pipelines: PipelineManager::new(),
            cache_pipelines: true,
        }
    }

    pub(crate) fn set_cache_pipelines(&mut self, cache: bool) {
        self.cache_pipelines = cache;
    }

    /// The type callers see.
    #[must_use]
    pub fn contract(&self) -> &Arc<TypeInfo> {
        &self.contract
    }

    /// The target's runtime type.
    #[must_use]
    pub fn implementation(&self) -> &Arc<TypeInfo> {
        &self.implementation
    }

    /// Proxy strategy used.
    #[must_use]
    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// Intercepted methods.
    #[must_use]
    pub fn methods(&self) -> &[MethodIdentity] {
        &self.methods
    }

    /// Effective behaviors in pipeline order.
    #[must_use]
    pub fn behaviors(&self) -> &[Arc<dyn Interceptor>] {
        &self.behaviors
    }

    /// The target object.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.target
    }

    /// Interfaces the proxy exposes: the contract when it is an interface,
    /// then those required by behaviors, without repeats.
    #[must_use]
    pub fn exposed_interfaces(&self) -> Vec<Arc<TypeInfo>> {
        let mut exposed: Vec<Arc<TypeInfo>> = Vec::new();
        let required = self.behaviors.iter().flat_map(|b| b.required_interfaces());
        let contract = self
            .contract
            .is_interface()
            .then(|| Arc::clone(&self.contract));
        for ty in contract.into_iter().chain(required) {
            if !exposed.iter().any(|e| e.same_type(&ty)) {
                exposed.push(ty);
            }
        }
        exposed
    }

    /// Append a behavior and drop built pipelines.
    ///
    /// A behavior that opts out of execution is ignored.
    pub fn add_behavior(&mut self, behavior: Arc<dyn Interceptor>) {
        if !behavior.will_execute() {
            debug!(behavior = behavior.name(), "behavior opted out of execution");
            return;
        }
        debug!(behavior = behavior.name(), rebuilt = self.pipelines.len(), "behavior added");
        self.behaviors.push(behavior);
        self.pipelines.clear();
    }

    /// Pipeline for `method`. Methods that are not intercepted get an empty
    /// pipeline.
    #[must_use]
    pub fn pipeline_for(&self, method: &MethodIdentity) -> Arc<Pipeline> {
        if !self.methods.contains(method) {
            return Arc::new(Pipeline::new());
        }
        let build = || executable_pipeline(self.behaviors.iter().cloned());
        if self.cache_pipelines {
            self.pipelines.initialize(method, build)
        } else {
            Arc::new(build())
        }
    }

    /// Intercepted method a caller reaches by `name` with `arity` arguments.
    ///
    /// Matches the interface method name when the call goes through a
    /// contract, the implementation method name otherwise. Overloads with the
    /// same arity are told apart with [`find_overload`](Self::find_overload);
    /// this returns the first declared.
    #[must_use]
    pub fn find_method(&self, name: &str, arity: usize) -> Option<&MethodIdentity> {
        self.candidates(name, arity).into_iter().next()
    }

    /// Intercepted method named `name` whose parameters have exactly
    /// `parameter_types`.
    #[must_use]
    pub fn find_overload(&self, name: &str, parameter_types: &[TypeRef]) -> Option<&MethodIdentity> {
        self.methods.iter().find(|identity| {
            let visible = visible_method(identity);
            visible.name() == name
                && visible.parameters().len() == parameter_types.len()
                && visible
                    .parameters()
                    .iter()
                    .zip(parameter_types)
                    .all(|(p, t)| p.type_ref() == t)
        })
    }

    fn candidates(&self, name: &str, arity: usize) -> Vec<&MethodIdentity> {
        self.methods
            .iter()
            .filter(|identity| {
                let visible = visible_method(identity);
                visible.name() == name && visible.parameters().len() == arity
            })
            .collect()
    }

    fn passthrough_method(&self, name: &str, arity: usize) -> Option<MethodSignature> {
        if self.kind != ProxyKind::Type {
            return None;
        }
        self.implementation
            .all_methods()
            .into_iter()
            .find(|m| m.name() == name && m.parameters().len() == arity)
    }

    /// Call the method named `method_name`.
    ///
    /// Fails when no such method exists, when several overloads take this
    /// many arguments, or when the arguments do not fit; a failure of the
    /// target is reported in the returned [`CallResult`]. Use
    /// [`invoke_method`](Self::invoke_method) with
    /// [`find_overload`](Self::find_overload) to call one overload.
    pub fn invoke(&self, method_name: &str, arguments: Vec<Value>) -> Result<CallResult> {
        let arity = arguments.len();
        match self.candidates(method_name, arity).as_slice() {
            [identity] => {
                let identity = (*identity).clone();
                return self.invoke_method(&identity, arguments);
            }
            [] => {}
            overloads => {
                return Err(InterceptError::AmbiguousMethod {
                    type_name: self.contract.full_name(),
                    method: method_name.to_string(),
                    arity,
                    count: overloads.len(),
                }
                .into());
            }
        }
        if let Some(method) = self.passthrough_method(method_name, arguments.len()) {
            trace!(method = %method, "calling method that is not intercepted");
            return self.invoke_method(&MethodIdentity::for_implementation(method), arguments);
        }
        Err(InterceptError::UnknownMethod {
            type_name: self.contract.full_name(),
            method: method_name.to_string(),
        }
        .into())
    }

    /// Call `method` through its pipeline.
    pub fn invoke_method(&self, method: &MethodIdentity, arguments: Vec<Value>) -> Result<CallResult> {
        let mut call = CallInvocation::new(Arc::clone(&self.target), method.clone(), arguments)?;
        let pipeline = self.pipeline_for(method);
        trace!(method = %method, behaviors = pipeline.count(), "proxy call");

        let dispatch = self.dispatch.as_ref();
        let terminal = |call: &mut CallInvocation| {
            let signature = call.method().clone();
            match dispatch.invoke(&signature, call.argument_values_mut()) {
                Ok(value) => call.create_return(value),
                Err(error) => {
                    debug!(method = %signature, %error, "target call failed");
                    call.create_exception(CallException::new(error))
                }
            }
        };
        Ok(pipeline.invoke(&mut call, &terminal))
    }
}

fn visible_method(identity: &MethodIdentity) -> &MethodSignature {
    identity
        .interface_method()
        .unwrap_or_else(|| identity.implementation_method())
}

impl fmt::Debug for InterceptingProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let behaviors: Vec<&str> = self.behaviors.iter().map(|b| b.name()).collect();
        f.debug_struct("InterceptingProxy")
            .field("contract", &self.contract.full_name())
            .field("implementation", &self.implementation.full_name())
            .field("kind", &self.kind)
            .field("methods", &self.methods.len())
            .field("behaviors", &behaviors)
            .finish_non_exhaustive()
    }
}
