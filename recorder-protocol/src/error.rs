//! Error types for the recorder request surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating or decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Page content was not valid base64.
    #[error("Invalid page encoding: {0}")]
    InvalidPageEncoding(String),

    /// Teletext page number outside 100..=899.
    #[error("Invalid teletext page: {0}")]
    InvalidTeletextPage(u16),

    /// Teletext subpage number out of range.
    #[error("Invalid teletext subpage: {0}")]
    InvalidTeletextSubPage(u16),
}

/// Error code carried in failure responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The serialized hardware context is gone.
    ServiceUnavailable,
    /// A request argument was rejected.
    InvalidArgument,
    /// The hardware backend reported a fault.
    BackendFault,
}

/// Body of a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
