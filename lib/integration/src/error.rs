//! Error types for the integration crate.
//!
//! - `MailError`: failures building or relaying a message
//! - `ProbeError`: failures probing the database

use std::fmt;

/// Errors from mail operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The relay is missing required settings.
    NotConfigured { setting: String },
    /// The message could not be built.
    InvalidMessage { reason: String },
    /// TLS parameters could not be built.
    Tls { reason: String },
    /// The SMTP conversation failed.
    Transport { reason: String },
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { setting } => {
                write!(f, "mail relay is not configured: {setting} is not set")
            }
            Self::InvalidMessage { reason } => write!(f, "invalid message: {reason}"),
            Self::Tls { reason } => write!(f, "TLS setup failed: {reason}"),
            Self::Transport { reason } => write!(f, "SMTP error: {reason}"),
        }
    }
}

impl std::error::Error for MailError {}

/// Errors from database probe operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No connection string is configured.
    NotConfigured,
    /// Connecting to the database failed.
    Connection { reason: String },
    /// A probe query failed.
    Query { query: String, reason: String },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "database connection string is not set"),
            Self::Connection { reason } => write!(f, "database connection failed: {reason}"),
            Self::Query { query, reason } => {
                write!(f, "query '{query}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ProbeError {}
