//! Error types for the recorder gateway.

use thiserror::Error;

/// Errors reported by a hardware backend.
///
/// `NoFreeCard`, `NotTunable` and `NotFound` describe situations the caller is
/// expected to check for; only `Fault` is a genuine backend failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Every card able to serve the request is occupied or excluded.
    #[error("No free card available")]
    NoFreeCard,

    /// No card can tune the requested channel.
    #[error("Channel not tunable: {0}")]
    NotTunable(String),

    /// The referenced stream or recording is unknown to the backend.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Driver-level failure.
    #[error("Backend fault: {0}")]
    Fault(String),
}

/// Errors returned to callers of the apartment dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The serialized execution context is shut down or dead.
    #[error("Hardware context unavailable")]
    Unavailable,

    /// The submitted operation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The submitted operation panicked; the context survived.
    #[error("Operation panicked: {0}")]
    Panicked(String),
}

/// Errors surfaced by the request gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The hardware context is gone; hardware-affine requests fail fast.
    #[error("Service unavailable")]
    Unavailable,

    /// A backend fault or panic while serving the request.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// The request carried an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Unavailable => GatewayError::Unavailable,
            DispatchError::Backend(e) => GatewayError::Backend(e.to_string()),
            DispatchError::Panicked(msg) => GatewayError::Backend(msg),
        }
    }
}

impl From<recorder_protocol::ProtocolError> for GatewayError {
    fn from(err: recorder_protocol::ProtocolError) -> Self {
        GatewayError::InvalidArgument(err.to_string())
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
