//! # Factory
//!
//! Creates concepts, resources, relationships, transactions and events of
//! registered types. Every method resolves the type first and checks it can be
//! instantiated the requested way (concrete, identifiable or not) before
//! anything is allocated.
//!
//! ## Initial Data
//!
//! `new_resource`, `new_concept`, `new_transaction` and `new_event` take an
//! optional JSON object. Its keys are read with the same rules as
//! [`Serializer::from_json`](crate::Serializer::from_json): a string in a
//! relationship field becomes a [`Relationship`] to the declared type, nested
//! objects become concepts or resources. Declared default values then fill
//! whatever the data left unset.
//!
//! ## Validation Mode
//!
//! [`FactoryOptions::validate`] decides whether the returned instance checks
//! every later mutation. Unvalidated instances are for staging partial data.

use crate::declaration::{fully_qualified_name, SYSTEM_NAMESPACE};
use crate::error::{ModelError, Result};
use crate::instance::{Concept, Relationship, Resource, Typed};
use crate::populator::Populator;
use crate::registry::ModelManager;
use crate::serializer::DeserializeOptions;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::debug;

/// Field set on new transactions and events.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Options for creating instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactoryOptions {
    /// Generate a UUID when the identifier is empty.
    pub generate_identifier: bool,
    /// Build an instance that checks every mutation.
    pub validate: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            generate_identifier: false,
            validate: true,
        }
    }
}

impl FactoryOptions {
    pub fn unvalidated() -> Self {
        Self {
            validate: false,
            ..Self::default()
        }
    }

    pub fn generated() -> Self {
        Self {
            generate_identifier: true,
            ..Self::default()
        }
    }
}

/// Creates instances of the types registered in one [`ModelManager`].
#[derive(Debug, Clone)]
pub struct Factory {
    models: Arc<ModelManager>,
}

impl Factory {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    pub fn model_manager(&self) -> &Arc<ModelManager> {
        &self.models
    }

    /// Creates a resource of `namespace.type_name`.
    ///
    /// Fails if the type is unknown, abstract or not identifiable. An empty
    /// `identifier` is replaced by a UUID when `generate_identifier` is set and
    /// rejected otherwise. The identifying key of `data`, if any, is ignored in
    /// favour of `identifier`.
    pub fn new_resource(
        &self,
        namespace: &str,
        type_name: &str,
        identifier: &str,
        data: Option<&Map<String, JsonValue>>,
        options: &FactoryOptions,
    ) -> Result<Resource> {
        let fqn = fully_qualified_name(namespace, type_name);
        debug!(type_name = %fqn, identifier, validate = options.validate, "new_resource");
        let identifier = if identifier.is_empty() && options.generate_identifier {
            uuid::Uuid::new_v4().to_string()
        } else {
            identifier.to_string()
        };
        let mut resource = self.create_resource(&fqn, identifier, options.validate)?;
        let id_field = self.models.identifier_field(&fqn);
        self.initialize(&mut resource, data, id_field, options.validate)?;
        Ok(resource)
    }

    /// Creates a concept of `namespace.type_name`. Fails if the type is
    /// identifiable or abstract.
    pub fn new_concept(
        &self,
        namespace: &str,
        type_name: &str,
        data: Option<&Map<String, JsonValue>>,
        options: &FactoryOptions,
    ) -> Result<Concept> {
        let fqn = fully_qualified_name(namespace, type_name);
        debug!(type_name = %fqn, validate = options.validate, "new_concept");
        let mut concept = self.create_concept(&fqn, options.validate)?;
        self.initialize(&mut concept, data, None, options.validate)?;
        Ok(concept)
    }

    /// Creates a reference to the resource `namespace.type_name#identifier`.
    /// The referenced resource does not need to exist.
    pub fn new_relationship(&self, namespace: &str, type_name: &str, identifier: &str) -> Result<Relationship> {
        let fqn = fully_qualified_name(namespace, type_name);
        debug!(type_name = %fqn, identifier, "new_relationship");
        self.relationship_to(&fqn, identifier)
    }

    /// Creates a transaction. The type must derive from the system
    /// `Transaction`; a missing identifier is always generated and `timestamp`
    /// is set to now unless `data` provides it.
    pub fn new_transaction(
        &self,
        namespace: &str,
        type_name: &str,
        identifier: Option<&str>,
        data: Option<&Map<String, JsonValue>>,
        options: &FactoryOptions,
    ) -> Result<Resource> {
        self.new_timestamped(namespace, type_name, identifier, data, options, "Transaction")
    }

    /// Creates an event; same rules as [`Factory::new_transaction`] for the
    /// system `Event`.
    pub fn new_event(
        &self,
        namespace: &str,
        type_name: &str,
        identifier: Option<&str>,
        data: Option<&Map<String, JsonValue>>,
        options: &FactoryOptions,
    ) -> Result<Resource> {
        self.new_timestamped(namespace, type_name, identifier, data, options, "Event")
    }

    fn new_timestamped(
        &self,
        namespace: &str,
        type_name: &str,
        identifier: Option<&str>,
        data: Option<&Map<String, JsonValue>>,
        options: &FactoryOptions,
        root: &str,
    ) -> Result<Resource> {
        let fqn = fully_qualified_name(namespace, type_name);
        let root_fqn = fully_qualified_name(SYSTEM_NAMESPACE, root);
        self.models.get_class_declaration(&fqn)?;
        if !self.models.is_subtype_of(&fqn, &root_fqn) {
            return Err(ModelError::instantiation(fqn, format!("not a {}", root_fqn)));
        }
        let options = FactoryOptions {
            generate_identifier: true,
            ..options.clone()
        };
        let mut resource = self.new_resource(namespace, type_name, identifier.unwrap_or(""), data, &options)?;
        if resource.get_property_value(TIMESTAMP_FIELD).is_none() {
            resource.set_property_value(TIMESTAMP_FIELD, Utc::now())?;
        }
        Ok(resource)
    }

    pub(crate) fn create_resource(&self, fqn: &str, identifier: String, validated: bool) -> Result<Resource> {
        let decl = self.models.get_class_declaration(fqn)?;
        if decl.is_enum() {
            return Err(ModelError::instantiation(fqn, "enums cannot be instantiated"));
        }
        if decl.is_abstract {
            return Err(ModelError::instantiation(fqn, "type is abstract"));
        }
        if !self.models.is_identifiable(fqn) {
            return Err(ModelError::instantiation(fqn, "type is not identifiable; use new_concept"));
        }
        if identifier.is_empty() {
            return Err(ModelError::instantiation(fqn, "identifier must be a non-empty string"));
        }
        Ok(Resource::new(self.models.clone(), fqn.to_string(), identifier, validated))
    }

    pub(crate) fn create_concept(&self, fqn: &str, validated: bool) -> Result<Concept> {
        let decl = self.models.get_class_declaration(fqn)?;
        if decl.is_enum() {
            return Err(ModelError::instantiation(fqn, "enums cannot be instantiated"));
        }
        if decl.is_abstract {
            return Err(ModelError::instantiation(fqn, "type is abstract"));
        }
        if self.models.is_identifiable(fqn) {
            return Err(ModelError::instantiation(fqn, "type is identifiable; use new_resource"));
        }
        Ok(Concept::new(self.models.clone(), fqn.to_string(), validated))
    }

    pub(crate) fn relationship_to(&self, fqn: &str, identifier: &str) -> Result<Relationship> {
        self.models.get_class_declaration(fqn)?;
        if !self.models.is_identifiable(fqn) {
            return Err(ModelError::instantiation(fqn, "relationships must target an identifiable type"));
        }
        if identifier.is_empty() {
            return Err(ModelError::instantiation(fqn, "identifier must be a non-empty string"));
        }
        Ok(Relationship::new(fqn.to_string(), identifier.to_string()))
    }

    /// Applies initial data, then declared defaults for fields still unset.
    fn initialize<T: Typed>(
        &self,
        target: &mut T,
        data: Option<&Map<String, JsonValue>>,
        skip: Option<&str>,
        validated: bool,
    ) -> Result<()> {
        let options = DeserializeOptions {
            validate: validated,
            ..DeserializeOptions::default()
        };
        let populator = Populator::new(self, &options);
        if let Some(data) = data {
            populator.populate(target, data, skip, validated)?;
        }

        let fqn = target.fully_qualified_type().to_string();
        for field in self.models.all_fields(&fqn) {
            let Some(default) = &field.default_value else {
                continue;
            };
            if target.get_property_value(&field.name).is_none() {
                let value = populator.convert_field(&fqn, field, default, validated)?;
                target.set_property_value(&field.name, value)?;
            }
        }
        Ok(())
    }
}
