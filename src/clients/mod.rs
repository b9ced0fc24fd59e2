//! Type-safe wrappers around the shared [`Serializer`](network_model::Serializer)
//! and [`Factory`](network_model::Factory), one per managed type.

mod customer_client;
mod error;
mod network_client;
mod order_client;

pub use customer_client::CustomerClient;
pub use error::NetworkError;
pub use network_client::NetworkClient;
pub use order_client::{OrderClient, Placement};
