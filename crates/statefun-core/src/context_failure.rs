//! User-raisable command failure: a message plus an optional gRPC status code.

use crate::error::RuntimeError;

/// A user-visible error carrying a message and an optional gRPC status code.
/// `OK` (0) is forbidden; valid codes are 1-16 inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextFailure {
    message: String,
    grpc_status: Option<i32>,
}

impl ContextFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            grpc_status: None,
        }
    }

    pub fn with_status(
        message: impl Into<String>,
        grpc_status: i32,
    ) -> Result<Self, RuntimeError> {
        if !(1..=16).contains(&grpc_status) {
            return Err(RuntimeError::InvalidStatus(grpc_status));
        }
        Ok(Self {
            message: message.into(),
            grpc_status: Some(grpc_status),
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn grpc_status(&self) -> Option<i32> {
        self.grpc_status
    }
}
