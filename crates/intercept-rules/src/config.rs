//! Serializable rule descriptions.
//!
//! Every [`MatchingRule`] except [`MatchingRule::Predicate`] has a declarative
//! form here, tagged by `kind`:
//!
//! ```json
//! { "kind": "name", "patterns": ["Withdraw", "Try*"], "ignoreCase": true }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::rules::{
    AnyRule, AssemblyRule, CustomAttributeRule, MatchingRule, NameRule, NamespaceRule,
    ParameterKind, ParameterTypeMatch, ParameterTypeRule, PropertyAccess, PropertyRule,
    ReturnTypeRule, SignatureRule, TagAttributeRule, TypeRule,
};

fn default_true() -> bool {
    true
}

/// Declarative form of a matching rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuleConfig {
    /// Matches everything.
    Always,
    /// Matches nothing.
    Never,
    /// Method name patterns.
    Name {
        /// Wildcard patterns; any may match.
        patterns: Vec<String>,
        /// Case-insensitive comparison.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Declaring type's namespace.
    Namespace {
        /// Namespace pattern; a trailing `.*` includes sub-namespaces.
        pattern: String,
        /// Case-insensitive comparison.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Property accessors.
    Property {
        /// Property name pattern.
        pattern: String,
        /// Which accessors match.
        #[serde(default)]
        access: PropertyAccess,
        /// Case-insensitive comparison.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Defining assembly.
    Assembly {
        /// Assembly display name, short or full.
        name: String,
    },
    /// Return type.
    ReturnType {
        /// Expected type name.
        type_name: String,
        /// Compare simple names only.
        #[serde(default)]
        ignore_namespace: bool,
    },
    /// Exact parameter types.
    Signature {
        /// Full type names in parameter order.
        parameter_types: Vec<String>,
    },
    /// Presence of parameter types.
    ParameterType {
        /// Entries; any may match.
        matches: Vec<ParameterTypeConfig>,
    },
    /// Exact declaring type.
    Type {
        /// Full or simple type name.
        type_name: String,
        /// Case-insensitive comparison.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Tag attribute.
    Tag {
        /// Tag value.
        tag: String,
        /// Case-insensitive comparison.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Named custom attribute on the method.
    CustomAttribute {
        /// Attribute name.
        name: String,
        /// Consult overridden base declarations.
        #[serde(default = "default_true")]
        inherited: bool,
    },
    /// Inverted rule.
    Not {
        /// Rule to invert.
        rule: Box<RuleConfig>,
    },
    /// Alternation.
    Any {
        /// Member rules.
        rules: Vec<RuleConfig>,
    },
}

/// Declarative form of a [`ParameterTypeMatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterTypeConfig {
    /// Type name.
    pub type_name: String,
    /// Where to look.
    #[serde(default)]
    pub kind: ParameterKind,
    /// Case-insensitive comparison.
    #[serde(default)]
    pub ignore_case: bool,
}

impl ParameterTypeConfig {
    fn build(&self) -> ParameterTypeMatch {
        let m = ParameterTypeMatch::new(&self.type_name, self.kind);
        if self.ignore_case { m.ignore_case() } else { m }
    }
}

impl RuleConfig {
    /// Compile into a rule.
    pub fn build(&self) -> Result<MatchingRule> {
        let rule = match self {
            Self::Always => MatchingRule::Always,
            Self::Never => MatchingRule::Never,
            Self::Name {
                patterns,
                ignore_case,
            } => MatchingRule::Name(NameRule::with_patterns(
                patterns.iter().map(String::as_str),
                *ignore_case,
            )?),
            Self::Namespace {
                pattern,
                ignore_case,
            } => MatchingRule::Namespace(NamespaceRule::new(pattern, *ignore_case)?),
            Self::Property {
                pattern,
                access,
                ignore_case,
            } => MatchingRule::Property(PropertyRule::new(pattern, *access, *ignore_case)?),
            Self::Assembly { name } => MatchingRule::Assembly(AssemblyRule::new(name)?),
            Self::ReturnType {
                type_name,
                ignore_namespace,
            } => MatchingRule::ReturnType(ReturnTypeRule::with_options(type_name, *ignore_namespace)),
            Self::Signature { parameter_types } => MatchingRule::Signature(SignatureRule::new(
                parameter_types.iter().map(String::as_str),
            )),
            Self::ParameterType { matches } => MatchingRule::ParameterType(ParameterTypeRule::new(
                matches.iter().map(ParameterTypeConfig::build),
            )),
            Self::Type {
                type_name,
                ignore_case,
            } => MatchingRule::Type(TypeRule::named(type_name, *ignore_case)),
            Self::Tag { tag, ignore_case } => {
                MatchingRule::Tag(TagAttributeRule::new(tag.clone(), *ignore_case))
            }
            Self::CustomAttribute { name, inherited } => {
                MatchingRule::CustomAttribute(CustomAttributeRule::new(name.clone(), *inherited))
            }
            Self::Not { rule } => rule.build()?.negate(),
            Self::Any { rules } => MatchingRule::Any(AnyRule::new(
                rules.iter().map(Self::build).collect::<Result<Vec<_>>>()?,
            )),
        };
        debug!(kind = rule.kind(), "built matching rule");
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RuleError;
    use crate::rules::fixtures::account;
    use crate::RuleSet;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> RuleConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserializes_tagged_rules() {
        let config = parse(json!({"kind": "name", "patterns": ["With*"], "ignoreCase": true}));
        assert_eq!(
            config,
            RuleConfig::Name {
                patterns: vec!["With*".into()],
                ignore_case: true
            }
        );
        let config = parse(json!({"kind": "customAttribute", "name": "Transactional"}));
        assert_eq!(
            config,
            RuleConfig::CustomAttribute {
                name: "Transactional".into(),
                inherited: true
            }
        );
    }

    #[test]
    fn builds_nested_rules() {
        let account = account();
        let config = parse(json!({
            "kind": "not",
            "rule": {"kind": "any", "rules": [
                {"kind": "name", "patterns": ["Deposit"]},
                {"kind": "returnType", "typeName": "System.Boolean"}
            ]}
        }));
        let rule = config.build().unwrap();
        assert!(!rule.matches(&account.method("Deposit").unwrap()));
        assert!(!rule.matches(&account.method("Withdraw").unwrap()));
        assert!(rule.matches(&account.method("Close").unwrap()));
    }

    #[test]
    fn parameter_type_defaults_to_input() {
        let account = account();
        let rule = parse(json!({
            "kind": "parameterType",
            "matches": [{"typeName": "System.Decimal"}]
        }))
        .build()
        .unwrap();
        assert!(rule.matches(&account.method("Deposit").unwrap()));
        assert!(!rule.matches(&account.method("Close").unwrap()));
    }

    #[test]
    fn assembly_name_only_versus_full_identity() {
        let string = intercept_core::TypeInfo::class(
            "System.String",
            intercept_core::AssemblyName::new("mscorlib")
                .with_version("4.0.0.0")
                .with_culture("neutral")
                .with_public_key_token("b77a5c561934e089"),
        )
        .method(intercept_core::MethodDecl::new("Trim").returns("System.String"))
        .build();
        let trim = string.method("Trim").unwrap();

        let short: RuleSet = [parse(json!({"kind": "assembly", "name": "mscorlib"})).build().unwrap()]
            .into_iter()
            .collect();
        assert!(short.matches(&trim));

        let full = parse(json!({
            "kind": "assembly",
            "name": "mscorlib, Version=9.9.9.9, Culture=neutral, PublicKeyToken=b77a5c561934e089"
        }))
        .build()
        .unwrap();
        assert!(!full.matches(&trim));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let config = RuleConfig::Name {
            patterns: vec!["[".into()],
            ignore_case: false,
        };
        assert_matches!(config.build(), Err(RuleError::InvalidPattern { pattern, .. }) if pattern == "[");
    }

    #[test]
    fn round_trips_through_json() {
        let config = RuleConfig::Property {
            pattern: "Balance".into(),
            access: PropertyAccess::Get,
            ignore_case: false,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["kind"], "property");
        assert_eq!(value["access"], "get");
        assert_eq!(serde_json::from_value::<RuleConfig>(value).unwrap(), config);
    }
}
