//! # intercept-runtime
//!
//! Turns policies and behaviors into working interception.
//!
//! - [`BehaviorSet`]: attached and contributed behaviors, resolved into the
//!   effective behavior list for one type pair
//! - [`PolicyInjectionBehavior`]: runs the handlers of matching policies as
//!   one behavior in the chain
//! - [`ProxyFactory`]: interface ([`InterfaceProxyFactory`]) and
//!   virtual-method ([`VirtualMethodProxyFactory`]) strategies deciding which
//!   methods are intercepted
//! - [`InterceptingProxy`]: drives calls through the behavior pipeline to a
//!   [`Dispatch`] target
//! - [`Intercept`]: creates proxies
//!
//! ## Lifecycle of one method
//!
//! Policies are evaluated when the proxy is created. The behavior pipeline is
//! built on the method's first call and reused; adding a behavior to the
//! proxy drops built pipelines so the next call rebuilds them.

#![deny(unsafe_code)]

pub mod behaviors;
pub mod errors;
pub mod injection;
pub mod intercept;
pub mod proxy;

pub use behaviors::BehaviorSet;
pub use errors::{Result, RuntimeError};
pub use injection::{POLICY_INJECTION_NAME, PolicyInjectionBehavior};
pub use intercept::Intercept;
pub use proxy::{
    Dispatch, InterceptingProxy, InterfaceProxyFactory, ProxyFactory, ProxyKind,
    VirtualMethodProxyFactory,
};
