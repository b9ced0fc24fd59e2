use network_model::ModelError;
use thiserror::Error;

/// Errors returned by the sample network's clients.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    /// Registry, factory, serializer or validation failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The network configuration document could not be read.
    #[error("Invalid network configuration: {0}")]
    Config(String),

    /// A client was handed an instance of another type.
    #[error("Expected an instance of {expected}, got {actual}")]
    UnexpectedType { expected: String, actual: String },

    /// The order's current status does not allow the requested change.
    #[error("Cannot {action} order {order_id} while it is {status}")]
    InvalidTransition {
        order_id: String,
        status: String,
        action: &'static str,
    },
}
