use thiserror::Error;

/// Errors raised by Any-Support.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnyError {
    #[error("unknown type URL: {0}")]
    UnknownType(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}
