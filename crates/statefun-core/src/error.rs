//! The runtime's error taxonomy. See [`crate::discovery`] for the
//! error-report formatting and [`crate::error::RuntimeError`]'s doc comments
//! for each variant's propagation rule.

use thiserror::Error;

/// Errors raised anywhere in the entity-hosting runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("unknown type URL: {0}")]
    UnknownType(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("method {method} is not registered on service {service}")]
    MethodNotInService { service: String, method: String },

    #[error("invalid gRPC status code: {0} (must be 1-16)")]
    InvalidStatus(i32),

    #[error("unknown CRDT kind: {0}")]
    UnknownCrdtKind(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unknown command type: {0}")]
    UnknownCommandType(String),

    /// Recoverable: becomes a Failure reply on the current command. The
    /// entity instance continues.
    #[error("{message}")]
    UserFailure {
        message: String,
        grpc_status: Option<i32>,
    },

    /// Closes all streams.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Closes this entity's stream with an error reported to the proxy; the
    /// proxy decides whether to reinstantiate.
    #[error("unrecoverable error for entity {entity_id}: {message}")]
    Unrecoverable { entity_id: String, message: String },
}

impl From<statefun_crdt::CrdtError> for RuntimeError {
    fn from(err: statefun_crdt::CrdtError) -> Self {
        match err {
            statefun_crdt::CrdtError::UnknownCrdtKind(tag) => RuntimeError::UnknownCrdtKind(tag),
        }
    }
}

impl From<statefun_any::AnyError> for RuntimeError {
    fn from(err: statefun_any::AnyError) -> Self {
        match err {
            statefun_any::AnyError::UnknownType(t) => RuntimeError::UnknownType(t),
            statefun_any::AnyError::SerializationError(e) => RuntimeError::SerializationError(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
