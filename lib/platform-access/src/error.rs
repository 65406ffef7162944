//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: failures while completing an OIDC login
//! - `SessionError`: failures encoding or decoding a session value

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No provider is registered under the requested name.
    ProviderNotFound { provider: String },
    /// The login flow state cookie was missing or unreadable.
    MissingFlowState,
    /// The `state` parameter did not match the stored flow state.
    StateMismatch,
    /// The callback did not carry an authorization code.
    MissingCode,
    /// The provider returned an error on the callback.
    ProviderError { provider: String, reason: String },
    /// The OIDC client could not be configured.
    Configuration { reason: String },
    /// Exchanging the authorization code failed.
    TokenExchange { reason: String },
    /// Fetching the user-info document failed.
    UserInfo { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderNotFound { provider } => {
                write!(f, "no provider for {provider} exists")
            }
            Self::MissingFlowState => {
                write!(f, "could not find a matching session for this request")
            }
            Self::StateMismatch => write!(f, "state token mismatch"),
            Self::MissingCode => write!(f, "callback is missing the authorization code"),
            Self::ProviderError { provider, reason } => {
                write!(f, "OIDC provider '{provider}' error: {reason}")
            }
            Self::Configuration { reason } => {
                write!(f, "OIDC configuration error: {reason}")
            }
            Self::TokenExchange { reason } => {
                write!(f, "OIDC token exchange error: {reason}")
            }
            Self::UserInfo { reason } => write!(f, "OIDC user info error: {reason}"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from session value handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session value could not be serialized.
    Encode { reason: String },
    /// The session value could not be deserialized.
    Decode { reason: String },
    /// The session cookie failed signature verification.
    InvalidSignature { name: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { reason } => write!(f, "failed to encode session value: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode session value: {reason}"),
            Self::InvalidSignature { name } => {
                write!(f, "session cookie '{name}' is not valid")
            }
        }
    }
}

impl std::error::Error for SessionError {}
