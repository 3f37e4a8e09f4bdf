//! Bridge error types

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Capability discovery failed: {0}")]
    Discovery(#[from] CapabilityError),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Malformed call payload: {0}")]
    Payload(String),

    #[error("Worker pool saturated")]
    PoolSaturated,

    #[error("Worker pool shut down")]
    PoolShutDown,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure raised while enumerating a host object's declared methods.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CapabilityError(pub String);

/// A host callable failure, packaged for delivery into the content context.
///
/// Serializes with the wire field names the content-side promise rejection
/// expects (`message`, `name`, `stack`).
#[derive(Debug, Clone, Serialize)]
pub struct CallFailure {
    pub message: String,
    #[serde(rename = "name")]
    pub kind: String,
    #[serde(rename = "stack")]
    pub trace: String,
}

impl CallFailure {
    pub fn new(
        message: impl Into<String>,
        kind: impl Into<String>,
        trace: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            trace: trace.into(),
        }
    }

    /// Package a panic payload from a host callable.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>, function: &str) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "host function panicked".to_string()
        };

        Self {
            message,
            kind: "PanicError".to_string(),
            trace: format!("panic in host function {}", function),
        }
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
