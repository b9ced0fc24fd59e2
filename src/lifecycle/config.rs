use network_model::{DeserializeOptions, FactoryOptions, SerializerOptions};
use serde::{Deserialize, Serialize};

use crate::clients::NetworkError;

/// Runtime settings for one [`NetworkDefinition`](super::NetworkDefinition).
///
/// Every section is optional in the JSON form; missing sections take their
/// defaults. Log levels are not configured here, see `RUST_LOG`.
///
/// ```json
/// { "name": "sales", "serializer": { "convertResourcesToRelationships": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    pub name: String,
    pub factory: FactoryOptions,
    pub serializer: SerializerOptions,
    pub deserializer: DeserializeOptions,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "sales-network".to_string(),
            factory: FactoryOptions::default(),
            serializer: SerializerOptions::default(),
            deserializer: DeserializeOptions::default(),
        }
    }
}

impl NetworkConfig {
    pub fn from_json(document: &str) -> Result<Self, NetworkError> {
        serde_json::from_str(document).map_err(|e| NetworkError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = NetworkConfig::from_json(
            r#"{ "name": "test", "deserializer": { "acceptResourcesForRelationships": true } }"#,
        )
        .unwrap();
        assert_eq!(config.name, "test");
        assert!(config.deserializer.accept_resources_for_relationships);
        assert!(config.deserializer.validate);
        assert_eq!(config.serializer, SerializerOptions::default());

        assert!(matches!(NetworkConfig::from_json("[]"), Err(NetworkError::Config(_))));
    }
}
