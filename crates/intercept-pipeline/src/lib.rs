//! # intercept-pipeline
//!
//! Composes independently written interceptors into one call.
//!
//! - [`Interceptor`]: a unit of cross-cutting logic wrapped around a call
//! - [`Next`]: index-based cursor handing a unit its successor on demand
//! - [`Pipeline`]: ordered units plus a terminal target, invoked by nested
//!   continuation passing
//! - [`PipelineManager`]: per-method pipeline cache
//!
//! A pipeline holds no per-call state. Once built it can be shared across
//! threads and invoked concurrently.

#![deny(unsafe_code)]

pub mod interceptor;
pub mod manager;
pub mod pipeline;

pub use interceptor::{FnInterceptor, Interceptor, Next, Terminal};
pub use manager::PipelineManager;
pub use pipeline::Pipeline;
