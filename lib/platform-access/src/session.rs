//! Session cookie options and the session value codec.
//!
//! A session is a single signed cookie holding the serialized
//! [`UserRecord`]. The value is JSON, base64url-encoded so it is always a
//! valid cookie value. Signing is the job of the cookie store; this module
//! only turns a user record into a string and back.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::SessionError;
use crate::user::UserRecord;

/// Name of the session cookie.
pub const SESSION_NAME: &str = "_user_session";

/// Session lifetime: 30 days.
pub const SESSION_MAX_AGE_SECONDS: i64 = 86_400 * 30;

/// Attributes applied to the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Cookie path, derived from the application base URL.
    pub path: String,
    /// Cookie max-age in seconds.
    pub max_age_seconds: i64,
    /// Whether the cookie is hidden from scripts.
    pub http_only: bool,
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
}

impl SessionOptions {
    /// Creates options for the given cookie path with the standard lifetime.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_age_seconds: SESSION_MAX_AGE_SECONDS,
            http_only: true,
            secure: false,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Encodes a user record into a session value.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn encode_user(user: &UserRecord) -> Result<String, SessionError> {
    let json = serde_json::to_vec(user).map_err(|e| SessionError::Encode {
        reason: e.to_string(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a session value back into a user record.
///
/// # Errors
///
/// Returns an error if the value is not valid base64url or does not hold a
/// user record.
pub fn decode_user(value: &str) -> Result<UserRecord, SessionError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| SessionError::Decode {
            reason: e.to_string(),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| SessionError::Decode {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_thirty_days_http_only() {
        let options = SessionOptions::new("/app");

        assert_eq!(options.path, "/app");
        assert_eq!(options.max_age_seconds, 2_592_000);
        assert!(options.http_only);
        assert!(!options.secure);
    }

    #[test]
    fn encoded_value_is_cookie_safe() {
        let user = UserRecord::new("alice+test@example.com", "openid-connect");
        let value = encode_user(&user).expect("encode");

        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(decode_user(&value).expect("decode"), user);
    }

    #[test]
    fn decode_rejects_non_base64() {
        let err = decode_user("not base64!").unwrap_err();
        assert!(matches!(err, SessionError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_unexpected_shape() {
        let value = URL_SAFE_NO_PAD.encode(br#"{"name":"alice"}"#);
        let err = decode_user(&value).unwrap_err();
        assert!(matches!(err, SessionError::Decode { .. }));
    }
}
