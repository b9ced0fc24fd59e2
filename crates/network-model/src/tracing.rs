//! # Observability & Tracing
//!
//! Every layer of the crate logs through `tracing` with structured fields.
//! Binaries and tests call [`setup_tracing`] once to install a subscriber.
//!
//! ## What Gets Traced
//!
//! - **Registration**: batches committed to a [`ModelManager`](crate::ModelManager) (`info`)
//! - **Instantiation**: every resource, concept and relationship the factory builds (`debug`)
//! - **Serialization**: `to_json` / `from_json` entry with the type involved (`debug`)
//! - **Rejections**: refused assignments and dropped undeclared JSON keys (`warn`)
//!
//! ## Usage Examples
//!
//! ```bash
//! # Registration and demo milestones only
//! RUST_LOG=info cargo run
//!
//! # Every instance built and every document read or written
//! RUST_LOG=debug cargo run
//!
//! # Only the model crate
//! RUST_LOG=network_model=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a round trip of the sample order reads:
//!
//! ```text
//! DEBUG new_resource type_name=net.Order identifier="ORD-1"
//! DEBUG to_json type_name=net.Order identifier="ORD-1"
//! DEBUG from_json class=Some(String("net.Order")) validate=true
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Panics if a global subscriber is already set; use [`try_setup_tracing`]
/// where that can happen (tests).
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // type_name fields carry the context
        .compact()
        .init();
}

/// Like [`setup_tracing`], but leaves an existing subscriber in place.
pub fn try_setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init();
}
