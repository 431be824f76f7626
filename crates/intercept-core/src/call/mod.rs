//! Call model: the data carried through one intercepted call.
//!
//! A [`CallInvocation`] is created fresh per call entry and owns the
//! argument storage. Two views address that storage:
//!
//! - [`CallInvocation::arguments`]: every parameter, including pure `out`
//! - [`CallInvocation::inputs`]: only parameters the caller supplies
//!
//! Both are index- and name-addressable and alias the same slots, so a write
//! through one view is visible through the other. The call ends with exactly
//! one [`CallResult`], built by [`CallInvocation::create_return`] or
//! [`CallInvocation::create_exception`].

mod context;
mod result;

pub use context::InvocationContext;
pub use result::{CallException, CallResult};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{InterceptError, Result};
use crate::identity::MethodIdentity;
use crate::metadata::{MethodSignature, ParameterInfo};

/// One intercepted call on its way through a pipeline.
pub struct CallInvocation {
    target: Arc<dyn Any + Send + Sync>,
    identity: MethodIdentity,
    arguments: Vec<Value>,
    input_positions: Vec<usize>,
    context: InvocationContext,
}

impl CallInvocation {
    /// Create an invocation for `identity` on `target`.
    ///
    /// `arguments` are ordered to match the implementation method's
    /// parameters; pure `out` positions should hold a placeholder
    /// (typically `Value::Null`).
    pub fn new(
        target: Arc<dyn Any + Send + Sync>,
        identity: MethodIdentity,
        arguments: Vec<Value>,
    ) -> Result<Self> {
        let parameters = identity.implementation_method().parameters();
        if parameters.len() != arguments.len() {
            return Err(InterceptError::ArgumentCountMismatch {
                method: identity.implementation_method().display_name(),
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }
        let input_positions = parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.direction().is_input())
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            target,
            identity,
            arguments,
            input_positions,
            context: InvocationContext::new(),
        })
    }

    /// The object the call is made on.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.target
    }

    /// The target as a concrete type.
    #[must_use]
    pub fn target_as<T: Any>(&self) -> Option<&T> {
        self.target.downcast_ref::<T>()
    }

    /// The implementing method being called.
    #[must_use]
    pub fn method(&self) -> &MethodSignature {
        self.identity.implementation_method()
    }

    /// Full identity, including the interface method when present.
    #[must_use]
    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    /// Every argument, aligned with the method's parameters.
    #[must_use]
    pub fn arguments(&self) -> ParameterView<'_> {
        ParameterView {
            parameters: self.identity.implementation_method().parameters(),
            values: &self.arguments,
            positions: Positions::All(self.arguments.len()),
        }
    }

    /// Mutable view over every argument.
    pub fn arguments_mut(&mut self) -> ParameterViewMut<'_> {
        let len = self.arguments.len();
        ParameterViewMut {
            parameters: self.identity.implementation_method().parameters(),
            values: &mut self.arguments,
            positions: Positions::All(len),
        }
    }

    /// Arguments the caller supplied (excludes pure `out` parameters).
    #[must_use]
    pub fn inputs(&self) -> ParameterView<'_> {
        ParameterView {
            parameters: self.identity.implementation_method().parameters(),
            values: &self.arguments,
            positions: Positions::Subset(&self.input_positions),
        }
    }

    /// Mutable view over the caller-supplied arguments.
    pub fn inputs_mut(&mut self) -> ParameterViewMut<'_> {
        ParameterViewMut {
            parameters: self.identity.implementation_method().parameters(),
            values: &mut self.arguments,
            positions: Positions::Subset(&self.input_positions),
        }
    }

    /// Raw argument storage, for terminal dispatchers.
    #[must_use]
    pub fn argument_values(&self) -> &[Value] {
        &self.arguments
    }

    /// Mutable raw argument storage, for terminal dispatchers writing
    /// by-ref and out values.
    pub fn argument_values_mut(&mut self) -> &mut [Value] {
        &mut self.arguments
    }

    /// Context bag shared for the lifetime of this call.
    #[must_use]
    pub fn context(&self) -> &InvocationContext {
        &self.context
    }

    /// Successful result: copies the current by-ref/out argument values into
    /// the result's outputs.
    #[must_use]
    pub fn create_return(&self, return_value: Option<Value>) -> CallResult {
        let (output_parameters, outputs): (Vec<ParameterInfo>, Vec<Value>) = self
            .identity
            .implementation_method()
            .parameters()
            .iter()
            .zip(&self.arguments)
            .filter(|(p, _)| p.direction().is_output())
            .map(|(p, v)| (p.clone(), v.clone()))
            .unzip();
        CallResult::success(return_value, output_parameters, outputs, self.context.clone())
    }

    /// Failed result carrying `exception`, with empty outputs.
    #[must_use]
    pub fn create_exception(&self, exception: CallException) -> CallResult {
        CallResult::failure(exception, self.context.clone())
    }
}

impl fmt::Debug for CallInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallInvocation")
            .field("method", &self.identity.implementation_method())
            .field("arguments", &self.arguments)
            .field("context", &self.context)
            .finish()
    }
}

/// Mapping from view position to storage slot.
#[derive(Debug, Clone, Copy)]
enum Positions<'a> {
    All(usize),
    Subset(&'a [usize]),
}

impl Positions<'_> {
    fn len(&self) -> usize {
        match self {
            Self::All(len) => *len,
            Self::Subset(slots) => slots.len(),
        }
    }

    fn slot(&self, index: usize) -> Option<usize> {
        match self {
            Self::All(len) => (index < *len).then_some(index),
            Self::Subset(slots) => slots.get(index).copied(),
        }
    }

    fn slots(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match self {
            Self::All(len) => Box::new(0..*len),
            Self::Subset(slots) => Box::new(slots.iter().copied()),
        }
    }
}

/// Read-only, index- and name-addressable view over argument storage.
#[derive(Debug, Clone, Copy)]
pub struct ParameterView<'a> {
    parameters: &'a [ParameterInfo],
    values: &'a [Value],
    positions: Positions<'a>,
}

impl<'a> ParameterView<'a> {
    /// Number of parameters in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.len() == 0
    }

    /// Value at view position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        let values = self.values;
        self.positions.slot(index).map(|slot| &values[slot])
    }

    /// Value of the parameter called `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&'a Value> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    /// Parameter description at view position `index`.
    #[must_use]
    pub fn parameter(&self, index: usize) -> Option<&'a ParameterInfo> {
        let parameters = self.parameters;
        self.positions.slot(index).map(|slot| &parameters[slot])
    }

    /// Parameter name at view position `index`.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&'a str> {
        self.parameter(index).map(ParameterInfo::name)
    }

    /// View position of the parameter called `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions
            .slots()
            .position(|slot| self.parameters[slot].name() == name)
    }

    /// Whether a parameter called `name` is in the view.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Parameters and values in view order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a ParameterInfo, &'a Value)> + '_ {
        let (parameters, values) = (self.parameters, self.values);
        self.positions
            .slots()
            .map(move |slot| (&parameters[slot], &values[slot]))
    }
}

/// Mutable counterpart of [`ParameterView`]; writes land in the shared
/// argument storage.
#[derive(Debug)]
pub struct ParameterViewMut<'a> {
    parameters: &'a [ParameterInfo],
    values: &'a mut [Value],
    positions: Positions<'a>,
}

impl ParameterViewMut<'_> {
    /// Read-only view of the same positions.
    #[must_use]
    pub fn as_view(&self) -> ParameterView<'_> {
        ParameterView {
            parameters: self.parameters,
            values: &*self.values,
            positions: self.positions,
        }
    }

    /// Number of parameters in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.len() == 0
    }

    /// Mutable value at view position `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        let slot = self.positions.slot(index)?;
        self.values.get_mut(slot)
    }

    /// Overwrite the value at view position `index`.
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let len = self.positions.len();
        let slot = self
            .get_mut(index)
            .ok_or(InterceptError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Overwrite the value of the parameter called `name`.
    pub fn set_by_name(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self
            .as_view()
            .index_of(name)
            .ok_or_else(|| InterceptError::UnknownParameter(name.to_string()))?;
        self.set(index, value)
    }
}
