//! # Validation
//!
//! Pure checks of values against field declarations. Validated instances run
//! [`check_assignment`] on every mutation; `validate()` runs
//! [`validate_typed`] over the whole graph.
//!
//! | Failure | Error |
//! |---------|-------|
//! | name not declared along the supertype chain | `UnknownField` |
//! | array/scalar shape, primitive kind, Integer range, enum value, target type | `TypeMismatch` |
//! | regex or range validator | `ConstraintViolation` |
//! | non-optional field unset | `MissingRequiredField` |
//!
//! A relationship field accepts a [`Relationship`](crate::Relationship) or a
//! full resource of a conforming type; how the latter is written out is the
//! serializer's decision.

use crate::declaration::{FieldDeclaration, FieldType, FieldValidator, PrimitiveType};
use crate::error::{ModelError, Result};
use crate::instance::{Instance, Typed, TypedData};
use crate::registry::ModelManager;
use crate::value::Value;

/// Resolves the field and checks a whole-value assignment to it.
pub(crate) fn check_assignment<'m>(
    models: &'m ModelManager,
    type_name: &str,
    field_name: &str,
    value: &Value,
) -> Result<&'m FieldDeclaration> {
    let field = declared_field(models, type_name, field_name)?;
    check_field_value(models, type_name, field, value)?;
    Ok(field)
}

pub(crate) fn declared_field<'m>(
    models: &'m ModelManager,
    type_name: &str,
    field_name: &str,
) -> Result<&'m FieldDeclaration> {
    models
        .find_field(type_name, field_name)
        .ok_or_else(|| ModelError::UnknownField {
            type_name: type_name.to_string(),
            field: field_name.to_string(),
        })
}

pub(crate) fn check_field_value(
    models: &ModelManager,
    type_name: &str,
    field: &FieldDeclaration,
    value: &Value,
) -> Result<()> {
    match (field.is_array, value) {
        (true, Value::Array(items)) => items
            .iter()
            .try_for_each(|item| check_element(models, type_name, field, item)),
        (true, other) => Err(ModelError::mismatch(
            type_name,
            &field.name,
            format!("{}[]", field.field_type),
            other.describe(),
        )),
        (false, Value::Array(_)) => Err(ModelError::mismatch(
            type_name,
            &field.name,
            field.field_type.to_string(),
            value.describe(),
        )),
        (false, other) => check_element(models, type_name, field, other),
    }
}

/// Checks one scalar, or one element of an array field.
pub(crate) fn check_element(
    models: &ModelManager,
    type_name: &str,
    field: &FieldDeclaration,
    value: &Value,
) -> Result<()> {
    let conforms = match (&field.field_type, value) {
        (FieldType::Primitive(PrimitiveType::String), Value::String(_)) => true,
        (FieldType::Primitive(PrimitiveType::Integer), Value::Integer(i)) => i32::try_from(*i).is_ok(),
        (FieldType::Primitive(PrimitiveType::Long), Value::Integer(_)) => true,
        (FieldType::Primitive(PrimitiveType::Double), Value::Double(_) | Value::Integer(_)) => true,
        (FieldType::Primitive(PrimitiveType::Boolean), Value::Boolean(_)) => true,
        (FieldType::Primitive(PrimitiveType::DateTime), Value::DateTime(_)) => true,
        (FieldType::Class(target), Value::String(name)) => models
            .get_class_declaration(target)
            .map(|decl| decl.is_enum() && decl.enum_values.iter().any(|v| v == name))
            .unwrap_or(false),
        (FieldType::Class(target), Value::Instance(instance)) => match instance.as_ref() {
            Instance::Concept(c) => models.is_subtype_of(c.fully_qualified_type(), target),
            Instance::Resource(r) => models.is_subtype_of(r.fully_qualified_type(), target),
            Instance::Relationship(_) => false,
        },
        (FieldType::Relationship(target), Value::Instance(instance)) => match instance.as_ref() {
            Instance::Relationship(r) => models.is_subtype_of(r.fully_qualified_type(), target),
            Instance::Resource(r) => models.is_subtype_of(r.fully_qualified_type(), target),
            Instance::Concept(_) => false,
        },
        _ => false,
    };
    if !conforms {
        return Err(ModelError::mismatch(
            type_name,
            &field.name,
            field.field_type.to_string(),
            value.describe(),
        ));
    }
    check_constraint(models, type_name, field, value)
}

fn check_constraint(
    models: &ModelManager,
    type_name: &str,
    field: &FieldDeclaration,
    value: &Value,
) -> Result<()> {
    let violation = |reason: String| ModelError::ConstraintViolation {
        type_name: type_name.to_string(),
        field: field.name.clone(),
        reason,
    };
    match (&field.validator, value) {
        (Some(FieldValidator::Regex(pattern)), Value::String(s)) => {
            let matched = match models.pattern(pattern) {
                Some(regex) => regex.is_match(s),
                None => regex::Regex::new(pattern).is_ok_and(|regex| regex.is_match(s)),
            };
            if matched {
                Ok(())
            } else {
                Err(violation(format!("{:?} does not match /{}/", s, pattern)))
            }
        }
        (Some(FieldValidator::Range { lower, upper }), value) => {
            let Some(n) = value.as_f64() else {
                return Ok(());
            };
            if lower.is_some_and(|lo| n < lo) || upper.is_some_and(|hi| n > hi) {
                Err(violation(format!(
                    "{} is outside [{}, {}]",
                    n,
                    lower.map_or("..".to_string(), |v| v.to_string()),
                    upper.map_or("..".to_string(), |v| v.to_string()),
                )))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// Integers assigned to `Double` fields are stored as doubles.
pub(crate) fn coerce(field: &FieldDeclaration, value: Value) -> Value {
    if field.field_type != FieldType::DOUBLE {
        return value;
    }
    match value {
        Value::Integer(i) => Value::Double(i as f64),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| coerce(field, v)).collect()),
        other => other,
    }
}

/// Checks every set property and that every required field is present,
/// descending into contained concepts and resources.
pub(crate) fn validate_typed(data: &TypedData) -> Result<()> {
    let models = data.models();
    let type_name = data.fqn();
    for (name, value) in data.properties() {
        let field = declared_field(models, type_name, name)?;
        check_field_value(models, type_name, field, value)?;
        validate_nested(value, field.is_relationship())?;
    }
    for field in models.all_fields(type_name) {
        if !field.optional && !data.properties().contains_key(&field.name) {
            return Err(ModelError::MissingRequiredField {
                type_name: type_name.to_string(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

/// Contained values are always checked. A resource standing in for a
/// relationship is only checked when it was itself built validated.
fn validate_nested(value: &Value, in_relationship: bool) -> Result<()> {
    match value {
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| validate_nested(item, in_relationship)),
        Value::Instance(instance) => match instance.as_ref() {
            Instance::Concept(c) => validate_typed(c.data()),
            Instance::Resource(r) if !in_relationship || r.is_validated() => validate_typed(r.data()),
            Instance::Resource(_) | Instance::Relationship(_) => Ok(()),
        },
        _ => Ok(()),
    }
}
