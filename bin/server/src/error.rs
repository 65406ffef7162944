//! Error types for server startup and request handling.
//!
//! - `ConfigError`: the environment could not be turned into an `AppConfig`
//! - `StartupError`: the process could not start or did not stop cleanly
//! - `HandlerError`: an integration handler failed; rendered as JSON

use std::fmt;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sample_app_integration::MailError;
use serde_json::json;

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing { var: String },
    /// A variable is present but unusable.
    Invalid { var: String, reason: String },
    /// The configuration source could not be read or deserialized.
    Source(config::ConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { var } => write!(f, "{var} must be set"),
            Self::Invalid { var, reason } => write!(f, "{var} is invalid: {reason}"),
            Self::Source(e) => write!(f, "failed to read configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::Source(e)
    }
}

/// Errors that stop the process.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    /// The shared outbound HTTP client could not be built.
    HttpClient { reason: String },
    /// The OIDC provider could not be registered.
    Oidc { reason: String },
    /// A listener could not be bound.
    Bind { port: u16, reason: String },
    /// A server stopped with an I/O error.
    Serve { server: &'static str, reason: String },
    /// In-flight requests did not finish within the grace period.
    ShutdownTimeout { server: &'static str, grace: Duration },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::HttpClient { reason } => write!(f, "failed to build HTTP client: {reason}"),
            Self::Oidc { reason } => write!(f, "failed to register OIDC provider: {reason}"),
            Self::Bind { port, reason } => write!(f, "failed to bind port {port}: {reason}"),
            Self::Serve { server, reason } => write!(f, "{server} server failed: {reason}"),
            Self::ShutdownTimeout { server, grace } => write!(
                f,
                "{server} server did not shut down within {}s",
                grace.as_secs()
            ),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Failure of an integration handler.
///
/// Rendered as status 500 with a `{"message": ...}` JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<MailError> for HandlerError {
    fn from(e: MailError) -> Self {
        Self::new(e.to_string())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": self.message })),
        )
            .into_response()
    }
}
