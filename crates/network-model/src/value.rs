//! Property values held by concepts and resources.

use crate::instance::{Concept, Instance, Relationship, Resource, Typed};
use chrono::{DateTime, Utc};

/// A single property value.
///
/// Integers of every declared width are held as `i64`; the declared field type
/// decides which range is legal. Enum fields hold the value's name as a
/// `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Instance(Box<Instance>),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        self.as_instance().and_then(Instance::as_relationship)
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::String(s) => format!("String {:?}", s),
            Value::Integer(i) => format!("Integer {}", i),
            Value::Double(d) => format!("Double {}", d),
            Value::Boolean(b) => format!("Boolean {}", b),
            Value::DateTime(dt) => format!("DateTime {}", dt.to_rfc3339()),
            Value::Instance(instance) => match instance.as_ref() {
                Instance::Concept(c) => format!("Concept {}", c.fully_qualified_type()),
                Instance::Resource(r) => format!("Resource {}#{}", r.fully_qualified_type(), r.identifier()),
                Instance::Relationship(r) => format!("Relationship {}", r.to_uri()),
            },
            Value::Array(items) => format!("Array of {}", items.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(Box::new(instance))
    }
}

impl From<Concept> for Value {
    fn from(concept: Concept) -> Self {
        Instance::Concept(concept).into()
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Instance::Resource(resource).into()
    }
}

impl From<Relationship> for Value {
    fn from(relationship: Relationship) -> Self {
        Instance::Relationship(relationship).into()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
