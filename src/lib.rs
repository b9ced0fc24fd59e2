//! # Business Network
//!
//! A sample sales network built on [`network_model`]: customers place orders,
//! placing an order records a transaction and emits an event, and every
//! record moves to and from JSON through one shared serializer.
//!
//! ## Core Components
//!
//! - **[model]**: The embedded model document and the names it declares.
//! - **[lifecycle]**: [`NetworkDefinition`](lifecycle::NetworkDefinition) loads the
//!   registry once and wires the factory, serializer and clients around it.
//! - **[clients]**: Type-specific wrappers ([`OrderClient`](clients::OrderClient),
//!   [`CustomerClient`](clients::CustomerClient)) over the generic factory and serializer.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Every instance built and every document written
//! RUST_LOG=debug cargo run
//! ```

pub mod clients;
pub mod lifecycle;
pub mod model;
