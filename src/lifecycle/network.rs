use network_model::{Factory, Introspector, ModelManager, Serializer};
use std::sync::Arc;
use tracing::{info, warn};

use super::NetworkConfig;
use crate::clients::{CustomerClient, NetworkError, OrderClient};
use crate::model;

/// Everything needed to work with one business network.
///
/// `NetworkDefinition` is responsible for:
/// - **Model Loading**: building the registry from the model document
/// - **Wiring**: handing the same registry to the factory, the serializer and every client
/// - **Teardown**: releasing the registry once no instance needs it
///
/// # Example
///
/// ```
/// use business_network::clients::NetworkClient;
/// use business_network::lifecycle::NetworkDefinition;
///
/// let network = NetworkDefinition::new().unwrap();
/// let customer = network
///     .customers
///     .register_customer("CUST-1", "Ada", Some("ada@example.com"))
///     .unwrap();
/// let order = network.orders.create_order("ORD-1", &customer, 25.0).unwrap();
/// assert_eq!(network.orders.export(&order).unwrap()["customer"], "CUST-1");
/// network.shutdown();
/// ```
pub struct NetworkDefinition {
    /// Client for customers (participants).
    pub customers: CustomerClient,

    /// Client for orders and their transactions and events.
    pub orders: OrderClient,

    config: NetworkConfig,
    models: Arc<ModelManager>,
    serializer: Serializer,
}

impl NetworkDefinition {
    /// Loads the sample network with the default configuration.
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Result<Self, NetworkError> {
        let models = model::load()?;
        Ok(Self::from_models(models, config))
    }

    /// Wires a network around an already populated registry.
    pub fn from_models(models: ModelManager, config: NetworkConfig) -> Self {
        let models = Arc::new(models);
        let factory = Factory::new(models.clone());
        let serializer = Serializer::new(factory.clone());
        info!(
            network = %config.name,
            declarations = models.class_declarations().len(),
            namespaces = ?models.namespaces(),
            "Business network ready"
        );
        Self {
            customers: CustomerClient::new(serializer.clone(), config.clone()),
            orders: OrderClient::new(serializer.clone(), config.clone()),
            config,
            models,
            serializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn introspector(&self) -> Introspector<'_> {
        Introspector::new(&self.models)
    }

    pub fn models(&self) -> &Arc<ModelManager> {
        &self.models
    }

    pub fn factory(&self) -> &Factory {
        self.serializer.factory()
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Drops the clients and the registry handle held here.
    ///
    /// Instances still alive keep the registry alive through their own
    /// handles; the count is logged. Returns the number of such handles.
    pub fn shutdown(self) -> usize {
        info!(network = %self.config.name, "Shutting down business network...");
        let Self {
            customers,
            orders,
            models,
            serializer,
            ..
        } = self;
        drop(customers);
        drop(orders);
        drop(serializer);

        let outstanding = Arc::strong_count(&models) - 1;
        if outstanding > 0 {
            warn!(outstanding, "Instances still reference the registry");
        }
        info!("Business network shutdown complete.");
        outstanding
    }
}
