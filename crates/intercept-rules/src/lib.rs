//! # intercept-rules
//!
//! Predicates over method signatures used to decide whether a policy applies.
//!
//! - Rule variants: name, namespace, property, assembly, return type,
//!   signature, parameter type, declaring type, tag, custom attribute
//! - Logical rules: always, never, negate, any-of, arbitrary predicate
//! - [`RuleSet`]: all member rules must match; an empty set matches nothing
//! - [`RuleConfig`]: serde form of every rule, for declarative configuration
//!
//! Every rule is a total, side-effect free function of the signature: a rule
//! that cannot evaluate a member (a return-type rule given a constructor, for
//! instance) reports no match.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod rule_set;
pub mod rules;

pub use config::{ParameterTypeConfig, RuleConfig};
pub use errors::{Result, RuleError};
pub use rule_set::RuleSet;
pub use rules::MatchingRule;
