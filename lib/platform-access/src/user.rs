//! The user record held in a session.
//!
//! A `UserRecord` is derived from the identity provider's user-info
//! response at login and lives only inside the session cookie. It is
//! never refreshed or re-validated against the provider.

use serde::{Deserialize, Serialize};

/// Identity of a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Email address reported by the identity provider.
    email: String,
    /// Name of the provider that authenticated the user.
    provider: String,
}

impl UserRecord {
    /// Creates a new user record.
    #[must_use]
    pub fn new(email: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            provider: provider.into(),
        }
    }

    /// Returns the user's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }
}
