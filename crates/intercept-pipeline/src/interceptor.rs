//! Interceptor trait and the successor cursor.
//!
//! Defines the [`Interceptor`] trait every chain unit implements. Policy
//! handlers and explicitly attached behaviors both implement it; the
//! [`Pipeline`](crate::Pipeline) treats them identically.

use std::fmt;
use std::sync::Arc;

use intercept_core::{CallInvocation, CallResult, TypeInfo};
use tracing::trace;

/// The real call at the end of a chain.
pub type Terminal<'a> = dyn Fn(&mut CallInvocation) -> CallResult + 'a;

/// A unit of cross-cutting logic invoked around a method call.
///
/// A unit receives the call and a [`Next`] cursor. It may call
/// [`Next::invoke`] zero times (short-circuit), once, or several times
/// (retry), and must return exactly one [`CallResult`].
///
/// # Ordering
///
/// [`order`](Interceptor::order) is consulted when handlers from several
/// policies are merged. Non-zero orders run first, ascending; `0` means
/// unordered. A pipeline never reorders its units.
///
/// # Opting out
///
/// Returning `false` from [`will_execute`](Interceptor::will_execute) keeps
/// the unit out of a pipeline when the pipeline is built.
pub trait Interceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Merge order. Default: 0 (unordered).
    fn order(&self) -> i32 {
        0
    }

    /// Whether this unit should be wired into a chain. Default: `true`.
    fn will_execute(&self) -> bool {
        true
    }

    /// Extra interfaces a proxy must expose for this unit. Default: none.
    fn required_interfaces(&self) -> Vec<Arc<TypeInfo>> {
        Vec::new()
    }

    /// The unit this one decorates, if it only adjusts another unit's
    /// metadata. Default: none.
    fn wrapped(&self) -> Option<&dyn Interceptor> {
        None
    }

    /// Handle the call.
    fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult;
}

/// Cursor over the rest of a chain.
///
/// Captures the current position, the unit list, and the terminal target.
/// The successor is resolved when [`invoke`](Next::invoke) is called, so a
/// unit may invoke it any number of times.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    units: &'a [Arc<dyn Interceptor>],
    position: usize,
    terminal: &'a Terminal<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        units: &'a [Arc<dyn Interceptor>],
        position: usize,
        terminal: &'a Terminal<'a>,
    ) -> Self {
        Self {
            units,
            position,
            terminal,
        }
    }

    /// Run the rest of the chain: the unit at this position, or the
    /// terminal target when no units remain.
    pub fn invoke(&self, call: &mut CallInvocation) -> CallResult {
        match self.units.get(self.position) {
            Some(unit) => {
                trace!(unit = unit.name(), position = self.position, method = %call.method(), "entering unit");
                unit.invoke(call, Self::new(self.units, self.position + 1, self.terminal))
            }
            None => {
                trace!(method = %call.method(), "invoking target");
                (self.terminal)(call)
            }
        }
    }

    /// Index of the unit this cursor will run next.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Units left before the terminal target.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.units.len().saturating_sub(self.position)
    }

    /// Whether invoking this cursor goes straight to the terminal target.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.remaining() == 0
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

type InvokeFn = dyn Fn(&mut CallInvocation, Next<'_>) -> CallResult + Send + Sync;

/// Interceptor built from a closure.
pub struct FnInterceptor {
    name: String,
    order: i32,
    invoke: Box<InvokeFn>,
}

impl FnInterceptor {
    /// Wrap `invoke` under `name`.
    pub fn new(
        name: impl Into<String>,
        invoke: impl Fn(&mut CallInvocation, Next<'_>) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            order: 0,
            invoke: Box::new(invoke),
        }
    }

    /// Set the merge order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl Interceptor for FnInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
        (self.invoke)(call, next)
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passthrough;

    impl Interceptor for Passthrough {
        fn name(&self) -> &str {
            "passthrough"
        }
        fn invoke(&self, call: &mut CallInvocation, next: Next<'_>) -> CallResult {
            next.invoke(call)
        }
    }

    #[test]
    fn trait_defaults() {
        let unit = Passthrough;
        assert_eq!(unit.order(), 0);
        assert!(unit.will_execute());
        assert!(unit.required_interfaces().is_empty());
    }

    #[test]
    fn cursor_position_and_remaining() {
        let units: Vec<Arc<dyn Interceptor>> = vec![Arc::new(Passthrough), Arc::new(Passthrough)];
        let terminal = |call: &mut CallInvocation| call.create_return(None);
        let next = Next::new(&units, 1, &terminal);
        assert_eq!(next.position(), 1);
        assert_eq!(next.remaining(), 1);
        assert!(!next.is_terminal());
        assert!(Next::new(&units, 2, &terminal).is_terminal());
    }

    #[test]
    fn fn_interceptor_carries_order() {
        let unit = FnInterceptor::new("audit", |call, next| next.invoke(call)).with_order(3);
        assert_eq!(unit.name(), "audit");
        assert_eq!(unit.order(), 3);
        assert!(format!("{unit:?}").contains("audit"));
    }
}
