use network_model::{FactoryOptions, Resource, Serializer, Typed, Value};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{CustomerClient, NetworkClient, NetworkError};
use crate::lifecycle::NetworkConfig;
use crate::model::{self, status};

/// The records produced by placing an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// The `PlaceOrder` transaction.
    pub transaction: Resource,
    /// The `OrderPlaced` event it emitted.
    pub event: Resource,
}

/// Client for orders of the sales network.
///
/// Status changes follow `OPEN -> PLACED -> SHIPPED`; open and placed orders
/// may be cancelled.
#[derive(Debug, Clone)]
pub struct OrderClient {
    serializer: Serializer,
    config: NetworkConfig,
}

impl OrderClient {
    pub fn new(serializer: Serializer, config: NetworkConfig) -> Self {
        Self { serializer, config }
    }

    /// Creates an open order for `customer`. An empty `order_id` is generated.
    #[instrument(skip(self, customer), fields(customer_id = customer.identifier()))]
    pub fn create_order(&self, order_id: &str, customer: &Resource, amount: f64) -> Result<Resource, NetworkError> {
        self.customer_type_check(customer)?;
        let options = FactoryOptions {
            generate_identifier: true,
            ..self.config.factory.clone()
        };
        let data = json!({ "customer": customer.identifier(), "amount": amount });
        let order = self.factory().new_resource(
            model::NAMESPACE,
            model::ORDER,
            order_id,
            data.as_object(),
            &options,
        )?;
        info!(order_id = order.identifier(), "Created order");
        Ok(order)
    }

    pub fn add_note(&self, order: &mut Resource, note: &str) -> Result<(), NetworkError> {
        self.expect_type(order)?;
        order.add_array_value("notes", note)?;
        Ok(())
    }

    /// Submits an open order: records a `PlaceOrder` transaction, emits
    /// `OrderPlaced` and moves the order to `PLACED`.
    #[instrument(skip(self, order), fields(order_id = order.identifier()))]
    pub fn place_order(&self, order: &mut Resource) -> Result<Placement, NetworkError> {
        self.expect_type(order)?;
        self.require_status(order, &[status::OPEN], "place")?;

        let customer = order
            .get_property_value("customer")
            .and_then(Value::as_instance)
            .and_then(|c| c.identifier())
            .unwrap_or_default()
            .to_string();
        let amount = order.get_property_value("amount").and_then(Value::as_f64).unwrap_or(0.0);

        let transaction = self.factory().new_transaction(
            model::NAMESPACE,
            model::PLACE_ORDER,
            None,
            json!({ "order": order.identifier(), "customer": customer }).as_object(),
            &self.config.factory,
        )?;
        let event = self.factory().new_event(
            model::NAMESPACE,
            model::ORDER_PLACED,
            None,
            json!({ "order": order.identifier(), "amount": amount }).as_object(),
            &self.config.factory,
        )?;
        order.set_property_value("status", status::PLACED)?;

        debug!(transaction_id = transaction.identifier(), event_id = event.identifier(), "Order placed");
        Ok(Placement { transaction, event })
    }

    pub fn ship_order(&self, order: &mut Resource) -> Result<(), NetworkError> {
        self.expect_type(order)?;
        self.require_status(order, &[status::PLACED], "ship")?;
        order.set_property_value("status", status::SHIPPED)?;
        Ok(())
    }

    pub fn cancel_order(&self, order: &mut Resource) -> Result<(), NetworkError> {
        self.expect_type(order)?;
        self.require_status(order, &[status::OPEN, status::PLACED], "cancel")?;
        order.set_property_value("status", status::CANCELLED)?;
        info!(order_id = order.identifier(), "Cancelled order");
        Ok(())
    }

    fn require_status(&self, order: &Resource, allowed: &[&str], action: &'static str) -> Result<(), NetworkError> {
        let current = order.get_property_value("status").and_then(Value::as_str).unwrap_or_default();
        if allowed.contains(&current) {
            return Ok(());
        }
        warn!(order_id = order.identifier(), status = current, action, "Rejected status change");
        Err(NetworkError::InvalidTransition {
            order_id: order.identifier().to_string(),
            status: current.to_string(),
            action,
        })
    }

    fn customer_type_check(&self, customer: &Resource) -> Result<(), NetworkError> {
        let expected = model::qualified(<CustomerClient as NetworkClient>::TYPE_NAME);
        if customer.instance_of(&expected) {
            Ok(())
        } else {
            Err(NetworkError::UnexpectedType {
                expected,
                actual: customer.fully_qualified_type().to_string(),
            })
        }
    }
}

impl NetworkClient for OrderClient {
    const TYPE_NAME: &'static str = model::ORDER;

    fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NetworkDefinition;
    use network_model::{ModelError, TIMESTAMP_FIELD};

    #[test]
    fn test_create_order_applies_defaults() {
        let network = NetworkDefinition::new().unwrap();
        let customer = network.customers.register_customer("CUST-9", "Bob", None).unwrap();

        let order = network.orders.create_order("ORD-1", &customer, 40.0).unwrap();
        assert_eq!(
            network.orders.export(&order).unwrap(),
            json!({
                "$class": "org.acme.sales.Order",
                "orderId": "ORD-1",
                "status": "OPEN",
                "customer": "CUST-9",
                "amount": 40.0,
                "quantity": 1
            })
        );

        let generated = network.orders.create_order("", &customer, 1.0).unwrap();
        assert!(!generated.identifier().is_empty());
    }

    #[test]
    fn test_order_lifecycle() {
        let network = NetworkDefinition::new().unwrap();
        let orders = &network.orders;
        let customer = network.customers.register_customer("CUST-9", "Bob", None).unwrap();
        let mut order = orders.create_order("ORD-1", &customer, 40.0).unwrap();

        let placement = orders.place_order(&mut order).unwrap();
        assert_eq!(order.get_property_value("status"), Some(&Value::from(status::PLACED)));
        assert!(placement.transaction.instance_of("org.hyperledger.composer.system.Transaction"));
        assert!(placement.event.get_property_value(TIMESTAMP_FIELD).is_some());
        let tx = orders.export(&placement.transaction).unwrap();
        assert_eq!(tx["order"], json!("ORD-1"));
        assert_eq!(tx["customer"], json!("CUST-9"));

        assert!(matches!(
            orders.place_order(&mut order),
            Err(NetworkError::InvalidTransition { action: "place", .. })
        ));
        orders.ship_order(&mut order).unwrap();
        assert!(matches!(
            orders.cancel_order(&mut order),
            Err(NetworkError::InvalidTransition { action: "cancel", .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_types_and_values() {
        let network = NetworkDefinition::new().unwrap();
        let orders = &network.orders;
        let customer = network.customers.register_customer("CUST-9", "Bob", None).unwrap();
        let mut order = orders.create_order("ORD-1", &customer, 40.0).unwrap();

        assert!(matches!(
            orders.create_order("ORD-2", &order, 1.0),
            Err(NetworkError::UnexpectedType { .. })
        ));
        assert!(matches!(
            orders.create_order("ORD-2", &customer, -5.0),
            Err(NetworkError::Model(ModelError::ConstraintViolation { .. }))
        ));
        assert!(matches!(
            order.set_property_value("status", "LOST"),
            Err(ModelError::TypeMismatch { .. })
        ));
        orders.add_note(&mut order, "leave at the door").unwrap();
        assert_eq!(orders.export(&order).unwrap()["notes"], json!(["leave at the door"]));
    }
}
