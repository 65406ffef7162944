//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug)]
pub enum AuthzError {
    /// The client is missing required configuration.
    InvalidInput {
        /// Error details.
        details: String,
    },
    /// Failed to reach the OpenFGA API.
    ConnectionFailed {
        /// Error details.
        details: String,
    },
    /// OpenFGA answered with a non-success status.
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        details: String,
    },
    /// The response body could not be parsed.
    InvalidResponse {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { details } => {
                write!(f, "invalid authorization input: {}", details)
            }
            Self::ConnectionFailed { details } => {
                write!(f, "failed to connect to authorization service: {}", details)
            }
            Self::RequestFailed { status, details } => {
                write!(
                    f,
                    "authorization request failed with status {}: {}",
                    status, details
                )
            }
            Self::InvalidResponse { details } => {
                write!(f, "invalid authorization response: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}
