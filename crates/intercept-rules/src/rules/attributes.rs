//! Attribute rules.

use intercept_core::{Attribute, MethodSignature};

/// Matches when the method or its declaring type carries a tag attribute with
/// the configured value. Inheritable tags on base declarations count.
#[derive(Debug, Clone)]
pub struct TagAttributeRule {
    tag: String,
    ignore_case: bool,
}

impl TagAttributeRule {
    /// Build a tag rule.
    #[must_use]
    pub fn new(tag: impl Into<String>, ignore_case: bool) -> Self {
        Self {
            tag: tag.into(),
            ignore_case,
        }
    }

    fn is_tag(&self, attribute: &Attribute) -> bool {
        attribute.as_tag().is_some_and(|t| {
            if self.ignore_case {
                t.eq_ignore_ascii_case(&self.tag)
            } else {
                t == self.tag
            }
        })
    }

    /// Whether a matching tag decorates the method or its type.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        method
            .attributes_with_inherited(true)
            .iter()
            .chain(method.declaring_type().attributes_with_inherited(true).iter())
            .any(|a| self.is_tag(a))
    }
}

/// Matches when the method carries a custom attribute with the given name.
#[derive(Debug, Clone)]
pub struct CustomAttributeRule {
    name: String,
    inherited: bool,
}

impl CustomAttributeRule {
    /// Build a rule; `inherited` also consults overridden base declarations.
    #[must_use]
    pub fn new(name: impl Into<String>, inherited: bool) -> Self {
        Self {
            name: name.into(),
            inherited,
        }
    }

    /// Whether the method carries the attribute.
    pub fn matches(&self, method: &MethodSignature) -> bool {
        method
            .attributes_with_inherited(self.inherited)
            .iter()
            .any(|a| a.custom_name() == Some(self.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::account;

    #[test]
    fn tag_on_method() {
        let account = account();
        let rule = TagAttributeRule::new("Audited", false);
        assert!(rule.matches(&account.method("Withdraw").unwrap()));
        assert!(!TagAttributeRule::new("audited", false).matches(&account.method("Withdraw").unwrap()));
        assert!(TagAttributeRule::new("audited", true).matches(&account.method("Withdraw").unwrap()));
    }

    #[test]
    fn tag_on_declaring_type_or_base() {
        let account = account();
        let rule = TagAttributeRule::new("ledger", false);
        assert!(rule.matches(&account.method("Deposit").unwrap()));
        assert!(!TagAttributeRule::new("Audited", false).matches(&account.method("Deposit").unwrap()));
    }

    #[test]
    fn custom_attribute_inheritance_flag() {
        let account = account();
        let close = account.method("Close").unwrap();
        assert!(CustomAttributeRule::new("Transactional", true).matches(&close));
        assert!(!CustomAttributeRule::new("Transactional", false).matches(&close));
    }
}
