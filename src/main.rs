use business_network::clients::{NetworkClient, NetworkError};
use business_network::lifecycle::{setup_tracing, NetworkDefinition};
use tracing::{error, info};

fn main() -> Result<(), NetworkError> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting sales network demo");
    let network = NetworkDefinition::new()?;

    let span = tracing::info_span!("customer_registration");
    let customer = span.in_scope(|| -> Result<_, NetworkError> {
        info!("Registering test customer");
        let mut customer = network
            .customers
            .register_customer("CUST-9", "Alice", Some("alice@example.com"))?;
        network
            .customers
            .set_address(&mut customer, "1 Main St", "Springfield", Some("12345"))?;
        Ok(customer)
    })?;
    info!(document = %network.customers.export(&customer)?, "Customer registered");

    let span = tracing::info_span!("order_processing");
    let (order, placement) = span.in_scope(|| -> Result<_, NetworkError> {
        let mut order = network.orders.create_order("ORD-1", &customer, 125.0)?;
        network.orders.add_note(&mut order, "gift wrap")?;
        let placement = network.orders.place_order(&mut order)?;
        Ok((order, placement))
    })?;

    let document = network.orders.export(&order)?;
    info!(%document, "Order placed");
    info!(document = %network.orders.export(&placement.transaction)?, "Transaction recorded");
    info!(document = %network.orders.export(&placement.event)?, "Event emitted");

    // Read the order back from its JSON form
    match network.orders.import(&document) {
        Ok(copy) if copy == order => info!(order_id = copy.identifier(), "Round trip ok"),
        Ok(copy) => error!(order_id = copy.identifier(), "Round trip changed the order"),
        Err(e) => error!(error = %e, "Round trip failed"),
    }

    drop((customer, order, placement));
    network.shutdown();
    Ok(())
}
