use network_model::{Factory, Relationship, Resource, Serializer, Typed};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::NetworkError;
use crate::lifecycle::NetworkConfig;
use crate::model;

/// Trait for type-specific clients to inherit JSON import/export.
///
/// Implementors expose the shared [`Serializer`] and the network
/// configuration; the options in the configuration apply to every call.
pub trait NetworkClient {
    /// Short name of the type the client manages, in [`model::NAMESPACE`].
    const TYPE_NAME: &'static str;

    fn serializer(&self) -> &Serializer;

    fn config(&self) -> &NetworkConfig;

    fn factory(&self) -> &Factory {
        self.serializer().factory()
    }

    /// Fails unless `resource` is an instance of the managed type.
    fn expect_type(&self, resource: &Resource) -> Result<(), NetworkError> {
        let expected = model::qualified(Self::TYPE_NAME);
        if resource.instance_of(&expected) {
            Ok(())
        } else {
            Err(NetworkError::UnexpectedType {
                expected,
                actual: resource.fully_qualified_type().to_string(),
            })
        }
    }

    /// Writes any resource of the network with the configured options.
    fn export(&self, resource: &Resource) -> Result<JsonValue, NetworkError> {
        debug!(type_name = %resource.fully_qualified_type(), identifier = resource.identifier(), "Exporting");
        Ok(self.serializer().to_json(resource, &self.config().serializer)?)
    }

    /// Reads a resource of the managed type.
    fn import(&self, json: &JsonValue) -> Result<Resource, NetworkError> {
        let instance = self.serializer().from_json(json, &self.config().deserializer)?;
        let actual = instance.fully_qualified_type().to_string();
        let resource = instance.into_resource().ok_or_else(|| NetworkError::UnexpectedType {
            expected: model::qualified(Self::TYPE_NAME),
            actual,
        })?;
        self.expect_type(&resource)?;
        Ok(resource)
    }

    /// A reference to the managed type by identifier.
    fn reference(&self, identifier: &str) -> Result<Relationship, NetworkError> {
        Ok(self
            .factory()
            .new_relationship(model::NAMESPACE, Self::TYPE_NAME, identifier)?)
    }
}
