use chrono::{TimeZone, Utc};
use network_model::{
    ClassDeclaration, DeserializeOptions, Factory, FactoryOptions, FieldDeclaration, FieldType,
    FieldValidator, Instance, ModelError, ModelManager, Serializer, SerializerOptions, Typed, Value,
};
use serde_json::json;
use std::sync::Arc;

fn models() -> Arc<ModelManager> {
    let mut models = ModelManager::new();
    models
        .add_class_declarations([
            ClassDeclaration::participant("net", "Customer")
                .identified_by("id")
                .with_field(FieldDeclaration::new("id", FieldType::STRING))
                .with_field(FieldDeclaration::new("name", FieldType::STRING).optional())
                .with_field(
                    FieldDeclaration::new("email", FieldType::STRING)
                        .optional()
                        .with_validator(FieldValidator::Regex("@".to_string())),
                ),
            ClassDeclaration::enumeration("net", "OrderStatus", ["OPEN", "SHIPPED", "CLOSED"]),
            ClassDeclaration::concept("net", "Address")
                .with_field(FieldDeclaration::new("street", FieldType::STRING))
                .with_field(
                    FieldDeclaration::new("zip", FieldType::STRING)
                        .with_validator(FieldValidator::Regex("^[0-9]{5}$".to_string())),
                ),
            ClassDeclaration::asset("net", "Order")
                .identified_by("id")
                .with_field(FieldDeclaration::new("id", FieldType::STRING))
                .with_field(FieldDeclaration::new("status", FieldType::class("net.OrderStatus")))
                .with_field(FieldDeclaration::new("customer", FieldType::relationship("net.Customer")))
                .with_field(FieldDeclaration::new("total", FieldType::DOUBLE).optional())
                .with_field(FieldDeclaration::new("quantity", FieldType::INTEGER).optional())
                .with_field(FieldDeclaration::new("placed", FieldType::DATE_TIME).optional())
                .with_field(FieldDeclaration::new("tags", FieldType::STRING).array().optional())
                .with_field(FieldDeclaration::new("shipTo", FieldType::class("net.Address")).optional()),
        ])
        .unwrap();
    Arc::new(models)
}

fn setup() -> (Factory, Serializer) {
    let factory = Factory::new(models());
    let serializer = Serializer::new(factory.clone());
    (factory, serializer)
}

#[test]
fn test_order_scenario() {
    let (factory, serializer) = setup();

    let order = factory
        .new_resource(
            "net",
            "Order",
            "ORD-1",
            json!({ "status": "OPEN", "customer": "CUST-9" }).as_object(),
            &FactoryOptions::default(),
        )
        .expect("Failed to create order");

    let json = serializer
        .to_json(&order, &SerializerOptions::default())
        .expect("Failed to serialize order");
    assert_eq!(
        json.to_string(),
        r#"{"$class":"net.Order","id":"ORD-1","status":"OPEN","customer":"CUST-9"}"#
    );

    let back = serializer
        .from_json(&json, &DeserializeOptions::default())
        .expect("Failed to deserialize order")
        .into_resource()
        .expect("Order should be a resource");
    assert_eq!(back.identifier(), "ORD-1");
    assert_eq!(back.get_property_value("status"), Some(&Value::from("OPEN")));

    let customer = back
        .get_property_value("customer")
        .and_then(Value::as_relationship)
        .expect("customer should be a relationship");
    assert!(customer.is_relationship());
    assert!(!customer.is_resource());
    assert_eq!(customer.fully_qualified_type(), "net.Customer");
    assert_eq!(customer.identifier(), "CUST-9");
}

#[test]
fn test_round_trip_preserves_every_kind_of_value() {
    let (factory, serializer) = setup();
    let placed = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let ship_to = factory
        .new_concept(
            "net",
            "Address",
            json!({ "street": "1 Main St", "zip": "12345" }).as_object(),
            &FactoryOptions::default(),
        )
        .unwrap();
    let mut order = factory
        .new_resource(
            "net",
            "Order",
            "ORD-2",
            json!({ "status": "SHIPPED", "customer": "CUST-1", "quantity": 3 }).as_object(),
            &FactoryOptions::default(),
        )
        .unwrap();
    order.set_property_value("total", 12.5).unwrap();
    order.set_property_value("placed", placed).unwrap();
    order.add_array_value("tags", "gift").unwrap();
    order.add_array_value("tags", "priority").unwrap();
    order.set_property_value("shipTo", ship_to).unwrap();

    let json = serializer.to_json(&order, &SerializerOptions::default()).unwrap();
    assert_eq!(
        json,
        json!({
            "$class": "net.Order",
            "id": "ORD-2",
            "status": "SHIPPED",
            "customer": "CUST-1",
            "total": 12.5,
            "quantity": 3,
            "placed": "2024-01-02T03:04:05Z",
            "tags": ["gift", "priority"],
            "shipTo": { "$class": "net.Address", "street": "1 Main St", "zip": "12345" }
        })
    );

    let back = serializer
        .from_json(&json, &DeserializeOptions::default())
        .unwrap()
        .into_resource()
        .unwrap();
    assert_eq!(back, order);
    assert_eq!(
        back.get_property_value("placed").and_then(Value::as_date_time),
        Some(&placed)
    );
    let nested = back.get_property_value("shipTo").and_then(Value::as_instance).unwrap();
    assert!(nested.is_concept());
    assert_eq!(serializer.to_json(&back, &SerializerOptions::default()).unwrap(), json);
}

#[test]
fn test_unknown_field_depends_on_validation() {
    let (factory, serializer) = setup();
    let data = json!({ "status": "OPEN", "customer": "CUST-9" });

    let mut validated = factory
        .new_resource("net", "Order", "ORD-1", data.as_object(), &FactoryOptions::default())
        .unwrap();
    assert!(matches!(
        validated.set_property_value("colour", "red"),
        Err(ModelError::UnknownField { field, .. }) if field == "colour"
    ));

    let mut loose = factory
        .new_resource("net", "Order", "ORD-1", data.as_object(), &FactoryOptions::unvalidated())
        .unwrap();
    loose.set_property_value("colour", "red").unwrap();
    assert_eq!(loose.get_property_value("colour"), Some(&Value::from("red")));
    assert!(!loose.is_validated());
    assert!(matches!(loose.validate(), Err(ModelError::UnknownField { .. })));

    let unchecked = SerializerOptions { validate: false, ..Default::default() };
    let json = serializer.to_json(&loose, &unchecked).unwrap();
    assert!(json.get("colour").is_none());
    assert!(matches!(
        serializer.to_json(&loose, &SerializerOptions::default()),
        Err(ModelError::UnknownField { .. })
    ));
}

#[test]
fn test_add_array_value_checks_elements() {
    let (factory, _) = setup();
    let data = json!({ "status": "OPEN", "customer": "CUST-9" });

    let mut order = factory
        .new_resource("net", "Order", "ORD-1", data.as_object(), &FactoryOptions::default())
        .unwrap();
    assert!(matches!(
        order.add_array_value("nope", "x"),
        Err(ModelError::UnknownField { field, .. }) if field == "nope"
    ));
    assert!(matches!(
        order.add_array_value("quantity", 1),
        Err(ModelError::TypeMismatch { field, .. }) if field == "quantity"
    ));
    assert!(matches!(
        order.add_array_value("tags", 1),
        Err(ModelError::TypeMismatch { field, .. }) if field == "tags"
    ));
    assert!(order.get_property_value("tags").is_none());

    let mut loose = factory
        .new_resource("net", "Order", "ORD-1", data.as_object(), &FactoryOptions::unvalidated())
        .unwrap();
    loose.add_array_value("nope", "x").unwrap();
    assert_eq!(
        loose.get_property_value("nope"),
        Some(&Value::Array(vec![Value::from("x")]))
    );
}

#[test]
fn test_type_mismatch_on_numeric_field() {
    let (factory, serializer) = setup();
    let mut order = factory
        .new_resource(
            "net",
            "Order",
            "ORD-1",
            json!({ "status": "OPEN", "customer": "CUST-9" }).as_object(),
            &FactoryOptions::default(),
        )
        .unwrap();

    assert!(matches!(
        order.set_property_value("quantity", "three"),
        Err(ModelError::TypeMismatch { field, .. }) if field == "quantity"
    ));
    assert!(matches!(
        order.set_property_value("quantity", i64::from(i32::MAX) + 1),
        Err(ModelError::TypeMismatch { .. })
    ));
    assert!(matches!(
        order.set_property_value("status", "LOST"),
        Err(ModelError::TypeMismatch { .. })
    ));
    assert!(order.get_property_value("quantity").is_none());

    let bad = json!({
        "$class": "net.Order",
        "id": "ORD-1",
        "status": "OPEN",
        "customer": "CUST-9",
        "quantity": "three"
    });
    assert!(matches!(
        serializer.from_json(&bad, &DeserializeOptions::default()),
        Err(ModelError::TypeMismatch { .. })
    ));
}

#[test]
fn test_integer_is_stored_as_double() {
    let (factory, _) = setup();
    let mut order = factory
        .new_resource(
            "net",
            "Order",
            "ORD-1",
            json!({ "status": "OPEN", "customer": "CUST-9", "total": 10 }).as_object(),
            &FactoryOptions::default(),
        )
        .unwrap();
    assert_eq!(order.get_property_value("total"), Some(&Value::Double(10.0)));
    order.set_property_value("total", 7).unwrap();
    assert_eq!(order.get_property_value("total"), Some(&Value::Double(7.0)));
}

#[test]
fn test_nested_constraint_violation() {
    let (_, serializer) = setup();
    let json = json!({
        "$class": "net.Order",
        "id": "ORD-1",
        "status": "OPEN",
        "customer": "CUST-9",
        "shipTo": { "street": "1 Main St", "zip": "ABCDE" }
    });
    assert!(matches!(
        serializer.from_json(&json, &DeserializeOptions::default()),
        Err(ModelError::ConstraintViolation { field, .. }) if field == "zip"
    ));

    let loose = DeserializeOptions { validate: false, ..Default::default() };
    let order = serializer.from_json(&json, &loose).unwrap();
    assert!(order.as_resource().is_some_and(|o| !o.is_validated()));
}

#[test]
fn test_accept_resources_for_relationships() {
    let (_, serializer) = setup();
    let json = json!({
        "$class": "net.Order",
        "id": "ORD-1",
        "status": "OPEN",
        "customer": { "$class": "net.Customer", "id": "CUST-9", "name": "Ada" }
    });

    assert!(matches!(
        serializer.from_json(&json, &DeserializeOptions::default()),
        Err(ModelError::SerializationError(_))
    ));

    let accepting = DeserializeOptions {
        accept_resources_for_relationships: true,
        ..Default::default()
    };
    let order = serializer.from_json(&json, &accepting).unwrap().into_resource().unwrap();
    let customer = order
        .get_property_value("customer")
        .and_then(Value::as_instance)
        .and_then(Instance::as_resource)
        .expect("customer should be a full resource");
    assert_eq!(customer.identifier(), "CUST-9");
    assert_eq!(customer.get_property_value("name"), Some(&Value::from("Ada")));

    let thin = serializer
        .to_json(
            &order,
            &SerializerOptions { convert_resources_to_relationships: true, ..Default::default() },
        )
        .unwrap();
    assert_eq!(thin["customer"], json!("CUST-9"));

    let full = serializer
        .to_json(
            &order,
            &SerializerOptions { permit_resources_for_relationships: true, ..Default::default() },
        )
        .unwrap();
    assert_eq!(full, json);
}

#[test]
fn test_expanded_resources_can_skip_validation() {
    let (_, serializer) = setup();
    let json = json!({
        "$class": "net.Order",
        "id": "ORD-1",
        "status": "OPEN",
        "customer": { "$class": "net.Customer", "id": "CUST-9", "email": "not-an-address" }
    });

    let strict = DeserializeOptions {
        accept_resources_for_relationships: true,
        ..Default::default()
    };
    assert!(matches!(
        serializer.from_json(&json, &strict),
        Err(ModelError::ConstraintViolation { field, .. }) if field == "email"
    ));

    let lenient = DeserializeOptions {
        accept_resources_for_relationships: true,
        validate_expanded_resources: false,
        ..Default::default()
    };
    let order = serializer.from_json(&json, &lenient).unwrap().into_resource().unwrap();
    assert!(order.is_validated());
    let customer = order
        .get_property_value("customer")
        .and_then(Value::as_instance)
        .and_then(Instance::as_resource)
        .unwrap();
    assert!(!customer.is_validated());
    order.validate().unwrap();
}

#[test]
fn test_instances_cross_threads() {
    let (factory, serializer) = setup();

    let documents: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let factory = factory.clone();
                let serializer = &serializer;
                scope.spawn(move || {
                    let order = factory
                        .new_resource(
                            "net",
                            "Order",
                            &format!("ORD-{}", i),
                            json!({ "status": "OPEN", "customer": "CUST-9" }).as_object(),
                            &FactoryOptions::default(),
                        )
                        .unwrap();
                    serializer.to_json(&order, &SerializerOptions::default()).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(documents.len(), 4);
    assert_eq!(documents[3]["id"], json!("ORD-3"));

    // A resource built on one thread can be serialized on another.
    let order = factory
        .new_resource(
            "net",
            "Order",
            "ORD-9",
            json!({ "status": "OPEN", "customer": "CUST-9" }).as_object(),
            &FactoryOptions::default(),
        )
        .unwrap();
    let json = std::thread::spawn(move || {
        Serializer::new(Factory::new(order.model_manager().clone()))
            .to_json(&order, &SerializerOptions::default())
            .unwrap()
    })
    .join()
    .unwrap();
    assert_eq!(json["id"], json!("ORD-9"));
}
