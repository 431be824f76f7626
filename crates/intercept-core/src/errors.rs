//! Configuration error types.
//!
//! Everything here is raised while building metadata, identities, or calls.
//! Failures of the intercepted code itself never surface as an
//! [`InterceptError`]; they travel inside a
//! [`CallResult`](crate::call::CallResult) instead.

use thiserror::Error;

/// Errors raised while constructing interception inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    /// A required value was missing or empty.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// A type was supplied where an interface contract is required.
    #[error("type '{type_name}' is not an interface")]
    NotAnInterface {
        /// Full name of the offending type.
        type_name: String,
    },

    /// An implementation type does not satisfy the requested contract.
    #[error("type '{implementation}' is not assignable to '{contract}'")]
    NotAssignable {
        /// Full name of the contract type.
        contract: String,
        /// Full name of the implementation type.
        implementation: String,
    },

    /// The argument list does not line up with the method's parameters.
    #[error("method '{method}' takes {expected} arguments but {actual} were supplied")]
    ArgumentCountMismatch {
        /// Method display name.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// No parameter with the given name exists in the collection.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A positional access fell outside the collection.
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// A type has no method matching the request.
    #[error("type '{type_name}' has no method '{method}'")]
    UnknownMethod {
        /// Full name of the searched type.
        type_name: String,
        /// Requested method name.
        method: String,
    },

    /// Several overloads match a lookup by name and argument count.
    #[error("type '{type_name}' has {count} overloads of '{method}' taking {arity} arguments")]
    AmbiguousMethod {
        /// Full name of the searched type.
        type_name: String,
        /// Requested method name.
        method: String,
        /// Supplied argument count.
        arity: usize,
        /// Number of matching overloads.
        count: usize,
    },

    /// An assembly display name could not be parsed.
    #[error("invalid assembly name: {0}")]
    InvalidAssemblyName(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, InterceptError>;
