//! Orchestration layer: loads a business network and wires its clients.

mod config;
mod network;

pub use config::NetworkConfig;
pub use network::NetworkDefinition;
pub use network_model::tracing::setup_tracing;
