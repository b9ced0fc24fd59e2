//! # Typed Instances
//!
//! Runtime values of declared types. [`Instance`] is a closed sum of the three
//! kinds the rest of the crate dispatches on:
//!
//! - [`Concept`]: structured value without identity.
//! - [`Resource`]: identifiable structured value owning its field data.
//! - [`Relationship`]: `(namespace, type, identifier)` reference to a resource
//!   that lives elsewhere. It owns no field data.
//!
//! Concepts and resources share their property-bag behaviour through the
//! [`Typed`] trait. Whether mutations are checked is a flag carried with the
//! data, fixed by the [`Factory`](crate::Factory) that built the instance.
//!
//! ```rust
//! use std::sync::Arc;
//! use network_model::{
//!     ClassDeclaration, Factory, FactoryOptions, FieldDeclaration, FieldType, ModelError,
//!     ModelManager, Typed,
//! };
//!
//! let mut models = ModelManager::new();
//! models
//!     .add_class_declaration(
//!         ClassDeclaration::asset("net", "Car")
//!             .identified_by("vin")
//!             .with_field(FieldDeclaration::new("vin", FieldType::STRING))
//!             .with_field(FieldDeclaration::new("doors", FieldType::INTEGER)),
//!     )
//!     .unwrap();
//! let factory = Factory::new(Arc::new(models));
//!
//! let mut car = factory
//!     .new_resource("net", "Car", "VIN-1", None, &FactoryOptions::default())
//!     .unwrap();
//! car.set_property_value("doors", 4).unwrap();
//! assert!(matches!(
//!     car.set_property_value("doors", "four"),
//!     Err(ModelError::TypeMismatch { .. })
//! ));
//! ```

use crate::declaration::{split_fully_qualified_name, ClassDeclaration};
use crate::error::{ModelError, Result};
use crate::registry::ModelManager;
use crate::validator;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Prefix of the URI form of a relationship.
pub const RESOURCE_URI_SCHEME: &str = "resource:";

/// Type, property bag and validation mode shared by concepts and resources.
#[derive(Clone)]
pub struct TypedData {
    models: Arc<ModelManager>,
    fqn: String,
    properties: BTreeMap<String, Value>,
    validated: bool,
}

impl TypedData {
    pub(crate) fn new(models: Arc<ModelManager>, fqn: String, validated: bool) -> Self {
        Self {
            models,
            fqn,
            properties: BTreeMap::new(),
            validated,
        }
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }
}

impl fmt::Debug for TypedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedData")
            .field("type", &self.fqn)
            .field("validated", &self.validated)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Behaviour shared by every instance that carries field data.
///
/// Implementors only expose their [`TypedData`]; everything else is provided.
/// [`Typed::before_set`] lets an implementor react to an assignment after it
/// has passed validation but before it is stored.
pub trait Typed {
    fn data(&self) -> &TypedData;

    fn data_mut(&mut self) -> &mut TypedData;

    /// Called for every accepted assignment before it is stored.
    fn before_set(&mut self, _field: &str, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn fully_qualified_type(&self) -> &str {
        &self.data().fqn
    }

    fn namespace(&self) -> &str {
        split_fully_qualified_name(self.fully_qualified_type()).0
    }

    fn type_name(&self) -> &str {
        split_fully_qualified_name(self.fully_qualified_type()).1
    }

    fn model_manager(&self) -> &Arc<ModelManager> {
        &self.data().models
    }

    fn class_declaration(&self) -> Result<&ClassDeclaration> {
        self.data().models.get_class_declaration(self.fully_qualified_type())
    }

    /// Whether this instance's type is `fqn` or one of its subtypes.
    fn instance_of(&self, fqn: &str) -> bool {
        self.data().models.is_subtype_of(self.fully_qualified_type(), fqn)
    }

    fn is_validated(&self) -> bool {
        self.data().validated
    }

    fn get_property_value(&self, name: &str) -> Option<&Value> {
        self.data().properties.get(name)
    }

    fn properties(&self) -> &BTreeMap<String, Value> {
        &self.data().properties
    }

    /// Assigns a property. Validated instances reject undeclared names and
    /// values that do not fit the declared type.
    fn set_property_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        let data = self.data();
        let mut value = value.into();
        if let Some(field) = data.models.find_field(&data.fqn, name) {
            value = validator::coerce(field, value);
        }
        if data.validated {
            if let Err(e) = validator::check_assignment(&data.models, &data.fqn, name, &value) {
                warn!(type_name = %data.fqn, field = name, error = %e, "Rejected assignment");
                return Err(e);
            }
        }
        self.before_set(name, &value)?;
        trace!(type_name = %self.fully_qualified_type(), field = name, "Property set");
        self.data_mut().properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Appends to an array property, creating it when unset.
    fn add_array_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        let data = self.data();
        let mut value = value.into();
        let field = data.models.find_field(&data.fqn, name);
        if let Some(field) = field {
            value = validator::coerce(field, value);
        }
        if data.validated {
            let field = validator::declared_field(&data.models, &data.fqn, name)?;
            let checked = if field.is_array {
                validator::check_element(&data.models, &data.fqn, field, &value)
            } else {
                Err(ModelError::mismatch(
                    &data.fqn,
                    name,
                    field.field_type.to_string(),
                    "an array append",
                ))
            };
            if let Err(e) = checked {
                warn!(type_name = %data.fqn, field = name, error = %e, "Rejected array value");
                return Err(e);
            }
        }
        let fqn = data.fqn.clone();
        match self.data_mut().properties.entry(name.to_string()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(Value::Array(vec![value]));
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                other => {
                    return Err(ModelError::mismatch(fqn, name, "an array", other.describe()));
                }
            },
        }
        Ok(())
    }

    /// Re-checks every set property and that every required field is set.
    fn validate(&self) -> Result<()> {
        validator::validate_typed(self.data())
    }
}

/// An identifiable structured value that owns its field data.
#[derive(Clone, Debug)]
pub struct Resource {
    identifier: String,
    data: TypedData,
}

impl Resource {
    /// Builds an empty resource with its identifier field set.
    pub(crate) fn new(
        models: Arc<ModelManager>,
        fqn: String,
        identifier: String,
        validated: bool,
    ) -> Self {
        let mut data = TypedData::new(models, fqn, validated);
        if let Some(id_field) = data.models.identifier_field(&data.fqn).map(str::to_string) {
            data.properties.insert(id_field, Value::String(identifier.clone()));
        }
        Self { identifier, data }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Changes the identifier, keeping the identifying field in step.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> Result<()> {
        let id_field = self.identifier_field_name();
        match id_field {
            Some(field) => self.set_property_value(&field, identifier.into()),
            None => Err(ModelError::instantiation(
                self.fully_qualified_type(),
                "type has no identifying field",
            )),
        }
    }

    pub fn is_resource(&self) -> bool {
        true
    }

    pub fn is_relationship(&self) -> bool {
        false
    }

    /// A reference to this resource.
    pub fn to_relationship(&self) -> Relationship {
        Relationship::new(self.data.fqn.clone(), self.identifier.clone())
    }

    pub fn to_uri(&self) -> String {
        self.to_relationship().to_uri()
    }

    fn identifier_field_name(&self) -> Option<String> {
        self.data.models.identifier_field(&self.data.fqn).map(str::to_string)
    }
}

impl Typed for Resource {
    fn data(&self) -> &TypedData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut TypedData {
        &mut self.data
    }

    fn before_set(&mut self, field: &str, value: &Value) -> Result<()> {
        if self.identifier_field_name().as_deref() != Some(field) {
            return Ok(());
        }
        match value {
            Value::String(id) if !id.is_empty() => {
                self.identifier = id.clone();
                Ok(())
            }
            other => Err(ModelError::mismatch(
                &self.data.fqn,
                field,
                "a non-empty String identifier",
                other.describe(),
            )),
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.data.fqn == other.data.fqn
            && self.data.properties == other.data.properties
    }
}

/// A structured value without identity.
#[derive(Clone, Debug)]
pub struct Concept {
    data: TypedData,
}

impl Concept {
    pub(crate) fn new(models: Arc<ModelManager>, fqn: String, validated: bool) -> Self {
        Self {
            data: TypedData::new(models, fqn, validated),
        }
    }
}

impl Typed for Concept {
    fn data(&self) -> &TypedData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut TypedData {
        &mut self.data
    }
}

impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        self.data.fqn == other.data.fqn && self.data.properties == other.data.properties
    }
}

/// A non-owning reference to a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Relationship {
    fqn: String,
    identifier: String,
}

impl Relationship {
    pub(crate) fn new(fqn: String, identifier: String) -> Self {
        Self { fqn, identifier }
    }

    pub fn namespace(&self) -> &str {
        split_fully_qualified_name(&self.fqn).0
    }

    pub fn type_name(&self) -> &str {
        split_fully_qualified_name(&self.fqn).1
    }

    pub fn fully_qualified_type(&self) -> &str {
        &self.fqn
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_resource(&self) -> bool {
        false
    }

    pub fn is_relationship(&self) -> bool {
        true
    }

    /// `resource:<namespace>.<Type>#<identifier>`
    pub fn to_uri(&self) -> String {
        format!("{}{}#{}", RESOURCE_URI_SCHEME, self.fqn, self.identifier)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// Splits a `resource:` URI into its type and identifier.
pub fn parse_resource_uri(uri: &str) -> Result<(&str, &str)> {
    let rest = uri.strip_prefix(RESOURCE_URI_SCHEME).ok_or_else(|| {
        ModelError::SerializationError(format!("{:?} is not a resource URI", uri))
    })?;
    match rest.split_once('#') {
        Some((fqn, id)) if !fqn.is_empty() && !id.is_empty() => Ok((fqn, id)),
        _ => Err(ModelError::SerializationError(format!(
            "resource URI {:?} must be resource:<type>#<id>",
            uri
        ))),
    }
}

/// Any typed instance.
#[derive(Clone, Debug, PartialEq)]
pub enum Instance {
    Concept(Concept),
    Resource(Resource),
    Relationship(Relationship),
}

impl Instance {
    pub fn is_concept(&self) -> bool {
        matches!(self, Instance::Concept(_))
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Instance::Resource(_))
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Instance::Relationship(_))
    }

    pub fn fully_qualified_type(&self) -> &str {
        match self {
            Instance::Concept(c) => c.fully_qualified_type(),
            Instance::Resource(r) => r.fully_qualified_type(),
            Instance::Relationship(r) => r.fully_qualified_type(),
        }
    }

    /// The identifier of a resource or relationship.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Instance::Concept(_) => None,
            Instance::Resource(r) => Some(r.identifier()),
            Instance::Relationship(r) => Some(r.identifier()),
        }
    }

    pub fn as_concept(&self) -> Option<&Concept> {
        match self {
            Instance::Concept(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Instance::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Instance::Relationship(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_concept(self) -> Option<Concept> {
        match self {
            Instance::Concept(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Instance::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_relationship(self) -> Option<Relationship> {
        match self {
            Instance::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Concept> for Instance {
    fn from(c: Concept) -> Self {
        Instance::Concept(c)
    }
}

impl From<Resource> for Instance {
    fn from(r: Resource) -> Self {
        Instance::Resource(r)
    }
}

impl From<Relationship> for Instance {
    fn from(r: Relationship) -> Self {
        Instance::Relationship(r)
    }
}

/// Borrowed view of an instance, accepted by the serializer.
#[derive(Clone, Copy, Debug)]
pub enum InstanceRef<'a> {
    Concept(&'a Concept),
    Resource(&'a Resource),
    Relationship(&'a Relationship),
}

impl<'a> From<&'a Concept> for InstanceRef<'a> {
    fn from(c: &'a Concept) -> Self {
        InstanceRef::Concept(c)
    }
}

impl<'a> From<&'a Resource> for InstanceRef<'a> {
    fn from(r: &'a Resource) -> Self {
        InstanceRef::Resource(r)
    }
}

impl<'a> From<&'a Relationship> for InstanceRef<'a> {
    fn from(r: &'a Relationship) -> Self {
        InstanceRef::Relationship(r)
    }
}

impl<'a> From<&'a Instance> for InstanceRef<'a> {
    fn from(instance: &'a Instance) -> Self {
        match instance {
            Instance::Concept(c) => InstanceRef::Concept(c),
            Instance::Resource(r) => InstanceRef::Resource(r),
            Instance::Relationship(r) => InstanceRef::Relationship(r),
        }
    }
}
