//! The sample sales network: customers placing orders.
//!
//! The declarations live in `network.json`, the document an external model
//! parser would produce, and are embedded at compile time.

use network_model::{fully_qualified_name, ModelManager, Result};

/// Namespace of every sample declaration.
pub const NAMESPACE: &str = "org.acme.sales";

pub const CUSTOMER: &str = "Customer";
pub const ORDER: &str = "Order";
pub const ADDRESS: &str = "Address";
pub const ORDER_STATUS: &str = "OrderStatus";
pub const PLACE_ORDER: &str = "PlaceOrder";
pub const ORDER_PLACED: &str = "OrderPlaced";

/// The model document.
pub const NETWORK_MODEL: &str = include_str!("network.json");

/// Order lifecycle states, as declared by the `OrderStatus` enum.
pub mod status {
    pub const OPEN: &str = "OPEN";
    pub const PLACED: &str = "PLACED";
    pub const SHIPPED: &str = "SHIPPED";
    pub const CANCELLED: &str = "CANCELLED";
}

/// Builds a registry holding the system declarations and the sample network.
pub fn load() -> Result<ModelManager> {
    ModelManager::from_json(NETWORK_MODEL)
}

/// `org.acme.sales.<name>`
pub fn qualified(name: &str) -> String {
    fully_qualified_name(NAMESPACE, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_model::Introspector;

    #[test]
    fn test_sample_model_loads() {
        let models = load().expect("sample model should be legal");
        let introspector = Introspector::new(&models);
        for name in [CUSTOMER, ORDER, ADDRESS, ORDER_STATUS, PLACE_ORDER, ORDER_PLACED] {
            introspector.get_class_declaration(&qualified(name)).unwrap();
        }
        let statuses = &introspector
            .get_class_declaration(&qualified(ORDER_STATUS))
            .unwrap()
            .enum_values;
        assert_eq!(statuses, &[status::OPEN, status::PLACED, status::SHIPPED, status::CANCELLED]);
        assert!(models.is_subtype_of(&qualified(PLACE_ORDER), "org.hyperledger.composer.system.Transaction"));
    }
}
