//! Decorator metadata attached to types and methods.

use serde_json::Value;

/// What an attribute declares.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    /// Disables every policy for the decorated member or type.
    NoPolicies,
    /// Free-form tag consulted by tag rules.
    Tag(String),
    /// Contributes a handler to the attribute-driven policy.
    Handler(HandlerDescriptor),
    /// Any other named attribute with optional data.
    Custom {
        /// Attribute name.
        name: String,
        /// Attribute payload.
        data: Value,
    },
}

/// Enough data to obtain a handler from the resolution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDescriptor {
    /// Registered handler type name.
    pub type_name: String,
    /// Optional registration name.
    pub name: Option<String>,
    /// Handler order; `0` means unordered.
    pub order: i32,
    /// Attribute-specific configuration passed to the handler factory.
    pub config: Value,
}

impl HandlerDescriptor {
    /// Describe a handler by its registered type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            order: 0,
            config: Value::Null,
        }
    }

    /// Set the registration name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the handler order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Attach configuration data.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// An attribute instance on a type or method.
///
/// `inherited` is the attribute's own inheritance flag: when `true`, the
/// attribute is also reported for overriding methods and derived types when a
/// caller asks for inherited attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    kind: AttributeKind,
    inherited: bool,
}

impl Attribute {
    /// Wrap an attribute kind; inheritable by default.
    #[must_use]
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            inherited: true,
        }
    }

    /// The no-policies marker.
    #[must_use]
    pub fn no_policies() -> Self {
        Self::new(AttributeKind::NoPolicies)
    }

    /// A tag attribute.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(AttributeKind::Tag(tag.into()))
    }

    /// A handler-producing attribute.
    #[must_use]
    pub fn handler(descriptor: HandlerDescriptor) -> Self {
        Self::new(AttributeKind::Handler(descriptor))
    }

    /// A custom named attribute.
    #[must_use]
    pub fn custom(name: impl Into<String>, data: Value) -> Self {
        Self::new(AttributeKind::Custom {
            name: name.into(),
            data,
        })
    }

    /// Mark the attribute as not inheritable.
    #[must_use]
    pub fn not_inherited(mut self) -> Self {
        self.inherited = false;
        self
    }

    /// The attribute kind.
    #[must_use]
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Whether the attribute flows to overriding members and derived types.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Whether this is the no-policies marker.
    #[must_use]
    pub fn is_no_policies(&self) -> bool {
        matches!(self.kind, AttributeKind::NoPolicies)
    }

    /// Tag value, for tag attributes.
    #[must_use]
    pub fn as_tag(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Handler descriptor, for handler attributes.
    #[must_use]
    pub fn as_handler(&self) -> Option<&HandlerDescriptor> {
        match &self.kind {
            AttributeKind::Handler(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Attribute name, for custom attributes.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Custom { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_inherit_by_default() {
        assert!(Attribute::tag("audited").is_inherited());
        assert!(!Attribute::tag("audited").not_inherited().is_inherited());
    }

    #[test]
    fn accessors_match_kind() {
        let tag = Attribute::tag("audited");
        assert_eq!(tag.as_tag(), Some("audited"));
        assert!(tag.as_handler().is_none());

        let handler = Attribute::handler(HandlerDescriptor::new("LogHandler").with_order(2));
        assert_eq!(handler.as_handler().map(|d| d.order), Some(2));

        let custom = Attribute::custom("Transactional", serde_json::json!({"timeout": 5}));
        assert_eq!(custom.custom_name(), Some("Transactional"));
        assert!(Attribute::no_policies().is_no_policies());
    }
}
