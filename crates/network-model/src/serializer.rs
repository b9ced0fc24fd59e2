//! # Serializer
//!
//! Converts instances to `serde_json::Value` and back.
//!
//! ## JSON Shape
//!
//! ```text
//! {"$class":"net.Order","id":"ORD-1","status":"OPEN","customer":"CUST-9"}
//! ```
//!
//! - `$class` comes first, then every set field in declaration order, root
//!   supertype first. Unset optional fields are omitted.
//! - Relationship fields hold the referenced identifier. When the referenced
//!   type is not the declared one (a subtype), the `resource:<type>#<id>` URI
//!   is written instead so the type survives the round trip.
//! - `DateTime` values are RFC 3339 strings.
//!
//! ## Relationships vs Resources
//!
//! References normally travel thin. A full resource found in a relationship
//! field is written as its identifier with
//! [`SerializerOptions::convert_resources_to_relationships`], inline with
//! [`SerializerOptions::permit_resources_for_relationships`], and is an error
//! otherwise. On the way in, an object in a relationship position is only
//! read with [`DeserializeOptions::accept_resources_for_relationships`].

use crate::declaration::FieldDeclaration;
use crate::error::{ModelError, Result};
use crate::factory::Factory;
use crate::instance::{Instance, InstanceRef, Typed, RESOURCE_URI_SCHEME};
use crate::populator::{Populator, CLASS_KEY};
use crate::value::Value;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::{debug, warn};

/// Options for [`Serializer::to_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializerOptions {
    /// Validate the whole graph before writing it.
    pub validate: bool,
    /// Write resources found in relationship fields as their identifier.
    pub convert_resources_to_relationships: bool,
    /// Write resources found in relationship fields in full.
    pub permit_resources_for_relationships: bool,
    /// Allow a bare relationship as the root; it is written as its identifier.
    pub permit_only_identifiers: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            validate: true,
            convert_resources_to_relationships: false,
            permit_resources_for_relationships: false,
            permit_only_identifiers: false,
        }
    }
}

/// Options for [`Serializer::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeserializeOptions {
    /// Build validated instances and validate the result.
    pub validate: bool,
    /// Read a full object where a relationship is declared.
    pub accept_resources_for_relationships: bool,
    /// Whether resources read for relationships are themselves validated.
    pub validate_expanded_resources: bool,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            accept_resources_for_relationships: false,
            validate_expanded_resources: true,
        }
    }
}

/// Moves instances of one business network to and from JSON.
#[derive(Debug, Clone)]
pub struct Serializer {
    factory: Factory,
}

impl Serializer {
    pub fn new(factory: Factory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Writes a concept or resource (or, if permitted, a bare relationship).
    pub fn to_json<'a>(&self, instance: impl Into<InstanceRef<'a>>, options: &SerializerOptions) -> Result<JsonValue> {
        match instance.into() {
            InstanceRef::Relationship(rel) if options.permit_only_identifiers => {
                debug!(uri = %rel, "to_json relationship identifier");
                Ok(JsonValue::String(rel.identifier().to_string()))
            }
            InstanceRef::Relationship(rel) => {
                warn!(uri = %rel, "Refusing to serialize a relationship as a resource");
                Err(ModelError::SerializationError(format!(
                    "{} is a relationship, not a resource; set permit_only_identifiers to write its identifier",
                    rel
                )))
            }
            InstanceRef::Resource(resource) => {
                debug!(type_name = %resource.fully_qualified_type(), identifier = resource.identifier(), "to_json");
                if options.validate {
                    resource.validate()?;
                }
                self.write_typed(resource, options)
            }
            InstanceRef::Concept(concept) => {
                debug!(type_name = %concept.fully_qualified_type(), "to_json");
                if options.validate {
                    concept.validate()?;
                }
                self.write_typed(concept, options)
            }
        }
    }

    /// Reads a JSON object carrying `$class` into a concept or resource.
    pub fn from_json(&self, json: &JsonValue, options: &DeserializeOptions) -> Result<Instance> {
        let object = json.as_object().ok_or_else(|| {
            ModelError::SerializationError(format!("expected a JSON object, got {}", json))
        })?;
        if !object.contains_key(CLASS_KEY) {
            return Err(ModelError::SerializationError(format!(
                "object has no {} property",
                CLASS_KEY
            )));
        }
        debug!(class = ?object.get(CLASS_KEY), validate = options.validate, "from_json");

        let populator = Populator::new(&self.factory, options);
        let instance = populator.instance_from_object(object, None, options.validate)?;
        if options.validate {
            match &instance {
                Instance::Concept(c) => c.validate()?,
                Instance::Resource(r) => r.validate()?,
                Instance::Relationship(_) => {}
            }
        }
        Ok(instance)
    }

    fn write_typed<T: Typed>(&self, typed: &T, options: &SerializerOptions) -> Result<JsonValue> {
        let fqn = typed.fully_qualified_type();
        let mut object = Map::new();
        object.insert(CLASS_KEY.to_string(), JsonValue::String(fqn.to_string()));
        for field in typed.model_manager().all_fields(fqn) {
            if let Some(value) = typed.get_property_value(&field.name) {
                let json = self.write_value(fqn, field, value, options)?;
                object.insert(field.name.clone(), json);
            }
        }
        Ok(JsonValue::Object(object))
    }

    fn write_value(
        &self,
        fqn: &str,
        field: &FieldDeclaration,
        value: &Value,
        options: &SerializerOptions,
    ) -> Result<JsonValue> {
        match value {
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Integer(i) => Ok(JsonValue::Number(Number::from(*i))),
            Value::Double(d) => Number::from_f64(*d).map(JsonValue::Number).ok_or_else(|| {
                ModelError::SerializationError(format!("{}.{} holds non-finite number {}", fqn, field.name, d))
            }),
            Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
            Value::DateTime(dt) => Ok(JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
            Value::Array(items) => items
                .iter()
                .map(|item| self.write_value(fqn, field, item, options))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array),
            Value::Instance(instance) => match (field.is_relationship(), instance.as_ref()) {
                (true, Instance::Relationship(rel)) => {
                    Ok(write_reference(field, rel.fully_qualified_type(), rel.identifier()))
                }
                (true, Instance::Resource(resource)) if options.convert_resources_to_relationships => {
                    Ok(write_reference(field, resource.fully_qualified_type(), resource.identifier()))
                }
                (true, Instance::Resource(resource)) if options.permit_resources_for_relationships => {
                    self.write_typed(resource, options)
                }
                (true, Instance::Resource(resource)) => Err(ModelError::SerializationError(format!(
                    "{}.{} holds resource {}#{} where a relationship is declared",
                    fqn,
                    field.name,
                    resource.fully_qualified_type(),
                    resource.identifier()
                ))),
                (false, Instance::Relationship(rel)) => Err(ModelError::SerializationError(format!(
                    "{}.{} holds relationship {} where a contained value is declared",
                    fqn, field.name, rel
                ))),
                (_, Instance::Concept(concept)) => self.write_typed(concept, options),
                (false, Instance::Resource(resource)) => self.write_typed(resource, options),
            },
        }
    }
}

/// Plain identifier when the target is exactly the declared type and the
/// identifier cannot be mistaken for a URI; full URI otherwise.
fn write_reference(field: &FieldDeclaration, fqn: &str, identifier: &str) -> JsonValue {
    let declared = field.field_type.type_reference();
    if declared == Some(fqn) && !identifier.starts_with(RESOURCE_URI_SCHEME) {
        JsonValue::String(identifier.to_string())
    } else {
        JsonValue::String(format!("{}{}#{}", RESOURCE_URI_SCHEME, fqn, identifier))
    }
}
