//! # Model Errors
//!
//! This module defines the error type shared by the registry, the factory, the
//! serializer and the validation layer. Each failure kind is its own variant so
//! callers can match on it instead of parsing messages.

use thiserror::Error;

/// Errors raised while registering models, building instances or moving them
/// to and from JSON.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// No declaration is registered under the fully-qualified name.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// The declaration graph is structurally invalid.
    #[error("Illegal model in {type_name}: {reason}")]
    IllegalModel { type_name: String, reason: String },

    /// The property is not declared on the type or any of its supertypes.
    #[error("Unknown field {field} on {type_name}")]
    UnknownField { type_name: String, field: String },

    /// The value does not have the shape the field declares.
    #[error("Type mismatch for {type_name}.{field}: expected {expected}, got {actual}")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// A non-optional field has no value.
    #[error("Missing required field {field} on {type_name}")]
    MissingRequiredField { type_name: String, field: String },

    /// The value is well typed but fails the field's declared validator.
    #[error("Constraint violated for {type_name}.{field}: {reason}")]
    ConstraintViolation {
        type_name: String,
        field: String,
        reason: String,
    },

    /// The type exists but cannot be instantiated the way it was asked for.
    #[error("Cannot instantiate {type_name}: {reason}")]
    InvalidInstantiation { type_name: String, reason: String },

    /// A JSON payload or an instance graph has a shape the serializer rejects.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModelError {
    pub(crate) fn illegal(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::IllegalModel {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn instantiation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidInstantiation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(
        type_name: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ModelError::TypeMismatch {
            type_name: type_name.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
