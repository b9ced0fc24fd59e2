//! # Network Model
//!
//! This crate provides the type system and JSON serialization engine for a
//! business network: a set of declared **assets**, **participants**,
//! **transactions**, **events**, **concepts** and **enums**, and the typed
//! instances built from them.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into four layers:
//!
//! 1. **Declarations** ([`ClassDeclaration`], [`FieldDeclaration`]) - the model as data
//! 2. **Registry** ([`ModelManager`], [`Introspector`]) - resolution of names, supertypes and fields
//! 3. **Instances** ([`Resource`], [`Concept`], [`Relationship`]) - typed runtime values
//! 4. **Construction** ([`Factory`], [`Serializer`]) - the only way instances come into being
//!
//! A [`ModelManager`] is populated once, wrapped in an [`Arc`](std::sync::Arc)
//! and shared read-only by every factory, serializer and instance. All
//! operations are synchronous; instances are plain values and may be moved to
//! other threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use network_model::{
//!     ClassDeclaration, DeserializeOptions, Factory, FactoryOptions, FieldDeclaration,
//!     FieldType, ModelManager, Serializer, SerializerOptions, Typed, Value,
//! };
//! use serde_json::json;
//!
//! let mut models = ModelManager::new();
//! models
//!     .add_class_declarations([
//!         ClassDeclaration::participant("net", "Customer")
//!             .identified_by("id")
//!             .with_field(FieldDeclaration::new("id", FieldType::STRING)),
//!         ClassDeclaration::enumeration("net", "OrderStatus", ["OPEN", "CLOSED"]),
//!         ClassDeclaration::asset("net", "Order")
//!             .identified_by("id")
//!             .with_field(FieldDeclaration::new("id", FieldType::STRING))
//!             .with_field(FieldDeclaration::new("status", FieldType::class("net.OrderStatus")))
//!             .with_field(FieldDeclaration::new("customer", FieldType::relationship("net.Customer"))),
//!     ])
//!     .unwrap();
//!
//! let factory = Factory::new(Arc::new(models));
//! let serializer = Serializer::new(factory.clone());
//!
//! let order = factory
//!     .new_resource(
//!         "net",
//!         "Order",
//!         "ORD-1",
//!         json!({ "status": "OPEN", "customer": "CUST-9" }).as_object(),
//!         &FactoryOptions::default(),
//!     )
//!     .unwrap();
//! let json = serializer.to_json(&order, &SerializerOptions::default()).unwrap();
//! assert_eq!(
//!     json.to_string(),
//!     r#"{"$class":"net.Order","id":"ORD-1","status":"OPEN","customer":"CUST-9"}"#
//! );
//!
//! let back = serializer
//!     .from_json(&json, &DeserializeOptions::default())
//!     .unwrap()
//!     .into_resource()
//!     .unwrap();
//! let customer = back.get_property_value("customer").and_then(Value::as_relationship).unwrap();
//! assert_eq!(customer.identifier(), "CUST-9");
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`] with a [`ModelError`]. Errors
//! name the type and field involved and are `Clone + PartialEq` so tests can
//! match on them directly.
//!
//! ## Observability
//!
//! See the [`tracing`] module for log levels and [`setup_tracing`](tracing::setup_tracing).

pub mod declaration;
pub mod error;
pub mod factory;
pub mod instance;
pub mod introspector;
mod populator;
pub mod registry;
pub mod serializer;
pub mod tracing;
mod validator;
pub mod value;

// Re-export core types for convenience
pub use declaration::{
    fully_qualified_name, split_fully_qualified_name, ClassDeclaration, DeclarationKind,
    FieldDeclaration, FieldType, FieldValidator, PrimitiveType, SYSTEM_NAMESPACE,
};
pub use error::{ModelError, Result};
pub use factory::{Factory, FactoryOptions, TIMESTAMP_FIELD};
pub use instance::{
    parse_resource_uri, Concept, Instance, InstanceRef, Relationship, Resource, Typed, TypedData,
    RESOURCE_URI_SCHEME,
};
pub use introspector::Introspector;
pub use populator::CLASS_KEY;
pub use registry::ModelManager;
pub use serializer::{DeserializeOptions, Serializer, SerializerOptions};
pub use value::Value;
