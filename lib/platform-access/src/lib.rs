//! Platform access types for sample-app.
//!
//! This crate provides:
//! - OIDC provider configuration with explicit endpoints (`OidcConfig`)
//! - The user record stored in a session (`UserRecord`)
//! - Session cookie options and the session value codec
//! - Authentication and session error types
//!
//! # Example
//!
//! ```
//! use sample_app_platform_access::{UserRecord, session};
//!
//! let user = UserRecord::new("alice@example.com", "openid-connect");
//! let value = session::encode_user(&user).expect("encode");
//! let decoded = session::decode_user(&value).expect("decode");
//!
//! assert_eq!(decoded, user);
//! ```

pub mod error;
pub mod oidc;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use error::{AuthenticationError, SessionError};
pub use oidc::{DEFAULT_PROVIDER_NAME, OidcConfig, OidcConfigBuilder};
pub use session::{SESSION_MAX_AGE_SECONDS, SESSION_NAME, SessionOptions};
pub use user::UserRecord;
