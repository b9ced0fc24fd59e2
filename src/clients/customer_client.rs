use network_model::{Resource, Serializer, Typed};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{NetworkClient, NetworkError};
use crate::lifecycle::NetworkConfig;
use crate::model;

/// Client for customers of the sales network.
#[derive(Debug, Clone)]
pub struct CustomerClient {
    serializer: Serializer,
    config: NetworkConfig,
}

impl CustomerClient {
    pub fn new(serializer: Serializer, config: NetworkConfig) -> Self {
        Self { serializer, config }
    }

    #[instrument(skip(self))]
    pub fn register_customer(
        &self,
        customer_id: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Resource, NetworkError> {
        let mut data = json!({ "name": name });
        if let Some(email) = email {
            data["email"] = json!(email);
        }
        let customer = self.factory().new_resource(
            model::NAMESPACE,
            model::CUSTOMER,
            customer_id,
            data.as_object(),
            &self.config.factory,
        )?;
        info!(customer_id = customer.identifier(), "Registered customer");
        Ok(customer)
    }

    /// Replaces the customer's postal address.
    pub fn set_address(
        &self,
        customer: &mut Resource,
        street: &str,
        city: &str,
        zip: Option<&str>,
    ) -> Result<(), NetworkError> {
        self.expect_type(customer)?;
        let mut data = json!({ "street": street, "city": city });
        if let Some(zip) = zip {
            data["zip"] = json!(zip);
        }
        let address = self.factory().new_concept(
            model::NAMESPACE,
            model::ADDRESS,
            data.as_object(),
            &self.config.factory,
        )?;
        debug!(customer_id = customer.identifier(), ?address, "Setting address");
        customer.set_property_value("address", address)?;
        Ok(())
    }
}

impl NetworkClient for CustomerClient {
    const TYPE_NAME: &'static str = model::CUSTOMER;

    fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    fn config(&self) -> &NetworkConfig {
        &self.config
    }
}
