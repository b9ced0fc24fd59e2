//! # Class Declarations
//!
//! The schema units held by the [`ModelManager`](crate::ModelManager). A
//! declaration names a type, its supertype, whether it is abstract, how it is
//! identified, and the fields it declares. Declarations are plain data: they
//! can be built in code with the builder methods below, or deserialized from
//! the JSON document an external model parser produces.
//!
//! ```rust
//! use network_model::{ClassDeclaration, FieldDeclaration, FieldType};
//!
//! let order = ClassDeclaration::asset("net", "Order")
//!     .identified_by("id")
//!     .with_field(FieldDeclaration::new("id", FieldType::STRING))
//!     .with_field(FieldDeclaration::new("customer", FieldType::relationship("net.Customer")));
//!
//! assert_eq!(order.fully_qualified_name(), "net.Order");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Namespace holding the built-in system declarations.
pub const SYSTEM_NAMESPACE: &str = "org.hyperledger.composer.system";

/// What a declaration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Asset,
    Participant,
    Transaction,
    Event,
    Concept,
    Enum,
}

impl Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclarationKind::Asset => "asset",
            DeclarationKind::Participant => "participant",
            DeclarationKind::Transaction => "transaction",
            DeclarationKind::Event => "event",
            DeclarationKind::Concept => "concept",
            DeclarationKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    Double,
    Boolean,
    DateTime,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveType::Integer | PrimitiveType::Long | PrimitiveType::Double
        )
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Primitive(PrimitiveType),
    /// A contained concept, resource or enum, by fully-qualified name.
    Class(String),
    /// A reference to an identifiable type, by fully-qualified name.
    Relationship(String),
}

impl FieldType {
    pub const STRING: FieldType = FieldType::Primitive(PrimitiveType::String);
    pub const INTEGER: FieldType = FieldType::Primitive(PrimitiveType::Integer);
    pub const LONG: FieldType = FieldType::Primitive(PrimitiveType::Long);
    pub const DOUBLE: FieldType = FieldType::Primitive(PrimitiveType::Double);
    pub const BOOLEAN: FieldType = FieldType::Primitive(PrimitiveType::Boolean);
    pub const DATE_TIME: FieldType = FieldType::Primitive(PrimitiveType::DateTime);

    pub fn class(fqn: impl Into<String>) -> Self {
        FieldType::Class(fqn.into())
    }

    pub fn relationship(fqn: impl Into<String>) -> Self {
        FieldType::Relationship(fqn.into())
    }

    /// The referenced type name, if this is not a primitive.
    pub fn type_reference(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Class(fqn) | FieldType::Relationship(fqn) => Some(fqn),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{}", p),
            FieldType::Class(fqn) => f.write_str(fqn),
            FieldType::Relationship(fqn) => write!(f, "--> {}", fqn),
        }
    }
}

/// Extra constraints on a field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValidator {
    /// The string must contain a match for the pattern.
    Regex(String),
    /// Inclusive numeric bounds; either side may be open.
    Range {
        #[serde(default)]
        lower: Option<f64>,
        #[serde(default)]
        upper: Option<f64>,
    },
}

/// One declared field of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub optional: bool,
    /// Scalar applied by the factory when initial data leaves the field unset.
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<FieldValidator>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_array: false,
            optional: false,
            default_value: None,
            validator: None,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.field_type, FieldType::Relationship(_))
    }
}

/// A schema entry: one named type in one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub namespace: String,
    pub name: String,
    pub kind: DeclarationKind,
    /// Fully-qualified name of the supertype.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
    /// Name of the identifying field declared here; inherited when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identified_by: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl ClassDeclaration {
    pub fn new(kind: DeclarationKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            super_type: None,
            is_abstract: false,
            identified_by: None,
            fields: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    pub fn asset(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Asset, namespace, name)
    }

    pub fn participant(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Participant, namespace, name)
    }

    pub fn transaction(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Transaction, namespace, name)
    }

    pub fn event(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Event, namespace, name)
    }

    pub fn concept(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Concept, namespace, name)
    }

    pub fn enumeration<I, S>(namespace: impl Into<String>, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut decl = Self::new(DeclarationKind::Enum, namespace, name);
        decl.enum_values = values.into_iter().map(Into::into).collect();
        decl
    }

    pub fn extends(mut self, super_type: impl Into<String>) -> Self {
        self.super_type = Some(super_type.into());
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn identified_by(mut self, field: impl Into<String>) -> Self {
        self.identified_by = Some(field.into());
        self
    }

    pub fn with_field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// `namespace.Name`
    pub fn fully_qualified_name(&self) -> String {
        fully_qualified_name(&self.namespace, &self.name)
    }

    /// Looks up a field declared directly on this class.
    pub fn own_field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DeclarationKind::Enum
    }
}

/// Joins a namespace and a short type name.
pub fn fully_qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Splits `a.b.Name` into `("a.b", "Name")`.
pub fn split_fully_qualified_name(fqn: &str) -> (&str, &str) {
    match fqn.rfind('.') {
        Some(idx) => (&fqn[..idx], &fqn[idx + 1..]),
        None => ("", fqn),
    }
}

/// The declarations every registry starts with.
pub(crate) fn system_declarations() -> Vec<ClassDeclaration> {
    vec![
        ClassDeclaration::asset(SYSTEM_NAMESPACE, "Asset").as_abstract(),
        ClassDeclaration::participant(SYSTEM_NAMESPACE, "Participant").as_abstract(),
        ClassDeclaration::transaction(SYSTEM_NAMESPACE, "Transaction")
            .as_abstract()
            .identified_by("transactionId")
            .with_field(FieldDeclaration::new("transactionId", FieldType::STRING))
            .with_field(FieldDeclaration::new("timestamp", FieldType::DATE_TIME)),
        ClassDeclaration::event(SYSTEM_NAMESPACE, "Event")
            .as_abstract()
            .identified_by("eventId")
            .with_field(FieldDeclaration::new("eventId", FieldType::STRING))
            .with_field(FieldDeclaration::new("timestamp", FieldType::DATE_TIME)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_and_joins_names() {
        assert_eq!(split_fully_qualified_name("org.acme.Order"), ("org.acme", "Order"));
        assert_eq!(split_fully_qualified_name("Order"), ("", "Order"));
        assert_eq!(fully_qualified_name("org.acme", "Order"), "org.acme.Order");
    }

    #[test]
    fn test_declarations_deserialize_from_model_json() {
        let json = r#"{
            "namespace": "net",
            "name": "Order",
            "kind": "asset",
            "identifiedBy": "id",
            "fields": [
                { "name": "id", "type": { "primitive": "String" } },
                { "name": "lines", "type": { "class": "net.Line" }, "isArray": true },
                { "name": "customer", "type": { "relationship": "net.Customer" } },
                { "name": "total", "type": { "primitive": "Double" },
                  "validator": { "range": { "lower": 0.0 } }, "default": 0.0 }
            ]
        }"#;
        let decl: ClassDeclaration = serde_json::from_str(json).unwrap();
        assert_eq!(decl.kind, DeclarationKind::Asset);
        assert_eq!(decl.identified_by.as_deref(), Some("id"));
        assert!(decl.own_field("lines").unwrap().is_array);
        assert!(decl.own_field("customer").unwrap().is_relationship());
        assert_eq!(
            decl.own_field("total").unwrap().validator,
            Some(FieldValidator::Range { lower: Some(0.0), upper: None })
        );
        assert!(decl.own_field("missing").is_none());
    }
}
