//! # intercept-policy
//!
//! Decides which interceptors apply to a method.
//!
//! - [`Policy`]: contributes handlers to the methods it applies to
//! - [`RuleDrivenPolicy`]: a [`RuleSet`](intercept_rules::RuleSet) plus an
//!   ordered handler list
//! - [`AttributeDrivenPolicy`]: handlers declared by attributes on the
//!   method and its type
//! - [`PolicySet`]: merges and orders handlers from several policies
//! - [`InterceptorResolver`] / [`InterceptorRegistry`]: obtain handler
//!   instances from `(type, name)` references
//!
//! Every policy rejects a method marked with the no-policies attribute on the
//! interface method, the implementation method, or either declaring type.

#![deny(unsafe_code)]

pub mod attribute_policy;
pub mod errors;
pub mod metadata;
pub mod policy;
pub mod policy_set;
pub mod resolver;
pub mod rule_policy;

pub use attribute_policy::{ATTRIBUTE_POLICY_NAME, AttributeDrivenPolicy};
pub use errors::{PolicyError, Result};
pub use metadata::{DeclaredMetadata, MetadataSource};
pub use policy::{Policy, is_excluded};
pub use policy_set::PolicySet;
pub use resolver::{InterceptorRef, InterceptorRegistry, InterceptorResolver, ResolutionContext};
pub use rule_policy::RuleDrivenPolicy;
