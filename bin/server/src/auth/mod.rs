//! Authentication for the sample-app server.
//!
//! This module provides:
//! - OIDC login against a single provider configured with explicit endpoints
//! - A signed-cookie session store holding the logged-in user
//! - The login, callback, logout and profile routes
//!
//! Sessions carry the user record itself. Once written, the record is
//! trusted until the cookie expires or is cleared on logout; it is never
//! re-validated against the identity provider.

pub mod oidc;
pub mod routes;
pub mod session;

pub use oidc::{AuthRedirect, OidcClient};
pub use routes::{AuthError, ProfileError, callback, login, logout, profile};
pub use session::{CookieSessionStore, FLOW_STATE_COOKIE, FlowState};
