//! JSON → instance conversion shared by the factory (initial data) and the
//! serializer (`from_json`). Every node is allocated through the
//! [`Factory`] so the same instantiation rules apply at any depth.

use crate::declaration::{FieldDeclaration, FieldType, PrimitiveType};
use crate::error::{ModelError, Result};
use crate::factory::Factory;
use crate::instance::{parse_resource_uri, Instance, Relationship, Typed, RESOURCE_URI_SCHEME};
use crate::serializer::DeserializeOptions;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

/// Key naming the fully-qualified type of a JSON object.
pub const CLASS_KEY: &str = "$class";

pub(crate) struct Populator<'f> {
    factory: &'f Factory,
    options: &'f DeserializeOptions,
}

impl<'f> Populator<'f> {
    pub(crate) fn new(factory: &'f Factory, options: &'f DeserializeOptions) -> Self {
        Self { factory, options }
    }

    /// Builds a concept or resource from a JSON object. `declared` is the type
    /// the enclosing field expects, used when the object has no `$class`.
    pub(crate) fn instance_from_object(
        &self,
        object: &Map<String, JsonValue>,
        declared: Option<&str>,
        validated: bool,
    ) -> Result<Instance> {
        let fqn = self.resolve_class(object, declared)?;
        let models = self.factory.model_manager();

        if let Some(id_field) = models.identifier_field(&fqn) {
            let identifier = match object.get(id_field) {
                Some(JsonValue::String(id)) => id.clone(),
                Some(other) => {
                    return Err(ModelError::mismatch(&fqn, id_field, "String", other.to_string()));
                }
                None => {
                    return Err(ModelError::MissingRequiredField {
                        type_name: fqn,
                        field: id_field.to_string(),
                    });
                }
            };
            let mut resource = self.factory.create_resource(&fqn, identifier, validated)?;
            self.populate(&mut resource, object, Some(id_field), validated)?;
            Ok(Instance::Resource(resource))
        } else {
            let mut concept = self.factory.create_concept(&fqn, validated)?;
            self.populate(&mut concept, object, None, validated)?;
            Ok(Instance::Concept(concept))
        }
    }

    /// Assigns every declared key of `object` to `target`. Keys starting with
    /// `$`, nulls and `skip` are left alone; undeclared keys are dropped.
    pub(crate) fn populate<T: Typed>(
        &self,
        target: &mut T,
        object: &Map<String, JsonValue>,
        skip: Option<&str>,
        validated: bool,
    ) -> Result<()> {
        let models = self.factory.model_manager().clone();
        let fqn = target.fully_qualified_type().to_string();
        for (key, json) in object {
            if key.starts_with('$') || json.is_null() || Some(key.as_str()) == skip {
                continue;
            }
            let Some(field) = models.find_field(&fqn, key) else {
                warn!(type_name = %fqn, field = %key, "Ignoring undeclared property");
                continue;
            };
            let value = self.convert_field(&fqn, field, json, validated)?;
            target.set_property_value(key, value)?;
        }
        Ok(())
    }

    pub(crate) fn convert_field(
        &self,
        fqn: &str,
        field: &FieldDeclaration,
        json: &JsonValue,
        validated: bool,
    ) -> Result<Value> {
        if !field.is_array {
            return self.convert_element(fqn, field, json, validated);
        }
        match json {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.convert_element(fqn, field, item, validated))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(ModelError::mismatch(
                fqn,
                &field.name,
                format!("{}[]", field.field_type),
                other.to_string(),
            )),
        }
    }

    fn convert_element(
        &self,
        fqn: &str,
        field: &FieldDeclaration,
        json: &JsonValue,
        validated: bool,
    ) -> Result<Value> {
        match &field.field_type {
            FieldType::Primitive(primitive) => convert_primitive(fqn, &field.name, *primitive, json),
            FieldType::Class(target) => {
                let decl = self.factory.model_manager().get_class_declaration(target)?;
                match json {
                    JsonValue::String(name) if decl.is_enum() => Ok(Value::String(name.clone())),
                    JsonValue::Object(object) if !decl.is_enum() => self
                        .instance_from_object(object, Some(target), validated)
                        .map(Value::from),
                    other => Err(ModelError::mismatch(
                        fqn,
                        &field.name,
                        target.as_str(),
                        other.to_string(),
                    )),
                }
            }
            FieldType::Relationship(target) => match json {
                JsonValue::String(reference) => {
                    self.relationship_from_str(target, reference).map(Value::from)
                }
                JsonValue::Object(object) if self.options.accept_resources_for_relationships => {
                    debug!(type_name = %fqn, field = %field.name, "Accepting expanded resource for relationship");
                    let expanded_validated = validated && self.options.validate_expanded_resources;
                    let instance = self.instance_from_object(object, Some(target), expanded_validated)?;
                    if !instance.is_resource() {
                        return Err(ModelError::SerializationError(format!(
                            "{}.{} expects a resource, got {}",
                            fqn,
                            field.name,
                            instance.fully_qualified_type()
                        )));
                    }
                    Ok(instance.into())
                }
                JsonValue::Object(_) => Err(ModelError::SerializationError(format!(
                    "{}.{} is a relationship; expected an identifier, got an object \
                     (resources are not accepted for relationships)",
                    fqn, field.name
                ))),
                other => Err(ModelError::mismatch(
                    fqn,
                    &field.name,
                    field.field_type.to_string(),
                    other.to_string(),
                )),
            },
        }
    }

    /// A plain identifier refers to the declared type; a `resource:` URI names
    /// its own type.
    fn relationship_from_str(&self, declared: &str, reference: &str) -> Result<Relationship> {
        if reference.starts_with(RESOURCE_URI_SCHEME) {
            let (fqn, id) = parse_resource_uri(reference)?;
            self.factory.relationship_to(fqn, id)
        } else {
            self.factory.relationship_to(declared, reference)
        }
    }

    fn resolve_class(&self, object: &Map<String, JsonValue>, declared: Option<&str>) -> Result<String> {
        match (object.get(CLASS_KEY), declared) {
            (Some(JsonValue::String(fqn)), _) => Ok(fqn.clone()),
            (Some(other), _) => Err(ModelError::SerializationError(format!(
                "{} must be a string, got {}",
                CLASS_KEY, other
            ))),
            (None, Some(declared)) => {
                let decl = self.factory.model_manager().get_class_declaration(declared)?;
                if decl.is_abstract {
                    Err(ModelError::SerializationError(format!(
                        "object without {} cannot be read as abstract type {}",
                        CLASS_KEY, declared
                    )))
                } else {
                    Ok(declared.to_string())
                }
            }
            (None, None) => Err(ModelError::SerializationError(format!(
                "object has no {} property",
                CLASS_KEY
            ))),
        }
    }
}

pub(crate) fn convert_primitive(
    fqn: &str,
    field: &str,
    primitive: PrimitiveType,
    json: &JsonValue,
) -> Result<Value> {
    let converted = match primitive {
        PrimitiveType::String => json.as_str().map(|s| Value::String(s.to_string())),
        PrimitiveType::Integer => json
            .as_i64()
            .filter(|i| i32::try_from(*i).is_ok())
            .map(Value::Integer),
        PrimitiveType::Long => json.as_i64().map(Value::Integer),
        PrimitiveType::Double => json.as_f64().map(Value::Double),
        PrimitiveType::Boolean => json.as_bool().map(Value::Boolean),
        PrimitiveType::DateTime => json
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
    };
    converted.ok_or_else(|| ModelError::mismatch(fqn, field, primitive.to_string(), json.to_string()))
}
