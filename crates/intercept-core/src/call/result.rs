//! Call outcomes.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::InvocationContext;
use crate::errors::{InterceptError, Result};
use crate::metadata::ParameterInfo;

/// An error raised by the intercepted target or by a unit in the chain.
///
/// Wraps the original error so callers can downcast back to the type the
/// target raised. Clones share the same error.
#[derive(Clone)]
pub struct CallException(Arc<anyhow::Error>);

impl CallException {
    /// Wrap any error.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(error.into()))
    }

    /// Build an exception from a message.
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Borrow the original error as `E`, if it has that type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for CallException {
    fn from(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }
}

impl fmt::Display for CallException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for CallException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallException")
            .field(&self.0.to_string())
            .finish()
    }
}

/// Outcome of one intercepted call.
///
/// Either a return value plus by-ref/out outputs, or an exception. `outputs`
/// is always present and is empty on the exception path. The context is the
/// same bag the originating invocation carried.
#[derive(Debug, Clone)]
pub struct CallResult {
    return_value: Option<Value>,
    outputs: Vec<Value>,
    output_parameters: Vec<ParameterInfo>,
    exception: Option<CallException>,
    context: InvocationContext,
}

impl CallResult {
    pub(crate) fn success(
        return_value: Option<Value>,
        output_parameters: Vec<ParameterInfo>,
        outputs: Vec<Value>,
        context: InvocationContext,
    ) -> Self {
        Self {
            return_value,
            outputs,
            output_parameters,
            exception: None,
            context,
        }
    }

    pub(crate) fn failure(exception: CallException, context: InvocationContext) -> Self {
        Self {
            return_value: None,
            outputs: Vec::new(),
            output_parameters: Vec::new(),
            exception: Some(exception),
            context,
        }
    }

    /// Return value of a successful call.
    #[must_use]
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    /// Replace the outcome with a successful return value.
    ///
    /// Outputs are left as they are, so an exception result turned into a
    /// success this way has no outputs. A handler recovering from an
    /// exception on a method with by-ref/out parameters builds a fresh
    /// result with [`CallInvocation::create_return`](crate::CallInvocation::create_return)
    /// instead.
    pub fn set_return_value(&mut self, value: Option<Value>) {
        self.return_value = value;
        self.exception = None;
    }

    /// Values at by-ref/out positions, in parameter order.
    #[must_use]
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    /// Output value by parameter name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.output_parameters
            .iter()
            .position(|p| p.name() == name)
            .and_then(|i| self.outputs.get(i))
    }

    /// Parameters describing each output position.
    #[must_use]
    pub fn output_parameters(&self) -> &[ParameterInfo] {
        &self.output_parameters
    }

    /// Overwrite an output value by position.
    pub fn set_output(&mut self, index: usize, value: Value) -> Result<()> {
        let len = self.outputs.len();
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(InterceptError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Error raised by the call, if it failed.
    #[must_use]
    pub fn exception(&self) -> Option<&CallException> {
        self.exception.as_ref()
    }

    /// Replace the outcome with an exception.
    pub fn set_exception(&mut self, exception: CallException) {
        self.exception = Some(exception);
        self.return_value = None;
        self.outputs.clear();
        self.output_parameters.clear();
    }

    /// Whether the call failed.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// The context bag shared with the originating invocation.
    #[must_use]
    pub fn context(&self) -> &InvocationContext {
        &self.context
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<Option<Value>, CallException> {
        match self.exception {
            Some(exception) => Err(exception),
            None => Ok(self.return_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("insufficient funds: balance {balance}")]
    struct InsufficientFunds {
        balance: i64,
    }

    #[test]
    fn exception_downcasts_to_original_type() {
        let exception = CallException::new(InsufficientFunds { balance: 3 });
        assert_eq!(exception.to_string(), "insufficient funds: balance 3");
        assert_eq!(
            exception.downcast_ref::<InsufficientFunds>().map(|e| e.balance),
            Some(3)
        );
    }

    #[test]
    fn set_exception_clears_success_values() {
        let mut result = CallResult::success(
            Some(json!(1)),
            vec![ParameterInfo::new(
                "total",
                "System.Int32".into(),
                crate::metadata::ParameterDirection::Out,
            )],
            vec![json!(2)],
            InvocationContext::new(),
        );
        assert_eq!(result.output("total"), Some(&json!(2)));

        result.set_exception(CallException::msg("denied"));
        assert!(result.is_exception());
        assert!(result.return_value().is_none());
        assert!(result.outputs().is_empty());
        assert_eq!(
            result.into_result().unwrap_err().to_string(),
            "denied"
        );
    }

    #[test]
    fn set_return_value_clears_exception() {
        let mut result = CallResult::failure(CallException::msg("boom"), InvocationContext::new());
        result.set_return_value(Some(json!("cached")));
        assert!(!result.is_exception());
        assert_eq!(result.into_result().unwrap(), Some(json!("cached")));
    }
}
