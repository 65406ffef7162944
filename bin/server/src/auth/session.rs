//! Signed-cookie session store.
//!
//! Two cookies are managed here, both signed with a key derived from
//! `APP_SECRET_KEY`:
//! - the session cookie holding the logged-in [`UserRecord`]
//! - a short-lived flow cookie holding the CSRF state and PKCE verifier of a
//!   login in progress
//!
//! Nothing is kept server side; a session is valid for as long as its cookie
//! verifies.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, SameSite, SignedCookieJar};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sample_app_platform_access::session::{decode_user, encode_user};
use sample_app_platform_access::{SESSION_NAME, SessionError, SessionOptions, UserRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration as TimeDuration, OffsetDateTime};

/// Flow cookie name.
pub const FLOW_STATE_COOKIE: &str = "_auth_state";

const FLOW_STATE_MAX_AGE_MINUTES: i64 = 10;

/// State of a login in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub provider: String,
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Cookie-backed session store.
#[derive(Clone)]
pub struct CookieSessionStore {
    key: Key,
    options: SessionOptions,
}

impl CookieSessionStore {
    /// Creates a store signing with a key derived from `secret`.
    pub fn new(secret: &[u8], options: SessionOptions) -> Self {
        Self {
            key: Key::from(&Sha512::digest(secret)[..]),
            options,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Signed view of the request cookies.
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Looks up the session user of a request.
    ///
    /// Returns `Ok(None)` when the request carries no session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie fails signature verification or does
    /// not hold a user record.
    pub fn load(&self, headers: &HeaderMap) -> Result<Option<UserRecord>, SessionError> {
        if CookieJar::from_headers(headers).get(SESSION_NAME).is_none() {
            return Ok(None);
        }

        let cookie = self
            .jar(headers)
            .get(SESSION_NAME)
            .ok_or_else(|| SessionError::InvalidSignature {
                name: SESSION_NAME.to_string(),
            })?;
        decode_user(cookie.value()).map(Some)
    }

    /// Writes a new session for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user record cannot be encoded.
    pub fn save(
        &self,
        jar: SignedCookieJar,
        user: &UserRecord,
    ) -> Result<SignedCookieJar, SessionError> {
        let value = encode_user(user)?;
        Ok(jar.add(self.cookie(
            SESSION_NAME,
            value,
            TimeDuration::seconds(self.options.max_age_seconds),
        )))
    }

    /// Expires the session cookie.
    pub fn invalidate(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.add(self.removal(SESSION_NAME))
    }

    /// Stores the state of a login in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized.
    pub fn save_flow_state(
        &self,
        jar: SignedCookieJar,
        state: &FlowState,
    ) -> Result<SignedCookieJar, SessionError> {
        let json = serde_json::to_vec(state).map_err(|e| SessionError::Encode {
            reason: e.to_string(),
        })?;
        Ok(jar.add(self.cookie(
            FLOW_STATE_COOKIE,
            URL_SAFE_NO_PAD.encode(json),
            TimeDuration::minutes(FLOW_STATE_MAX_AGE_MINUTES),
        )))
    }

    /// Reads the state of a login in progress, if any verifies.
    pub fn load_flow_state(&self, headers: &HeaderMap) -> Option<FlowState> {
        let cookie = self.jar(headers).get(FLOW_STATE_COOKIE)?;
        let bytes = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Expires the flow cookie.
    pub fn clear_flow_state(&self, jar: SignedCookieJar) -> SignedCookieJar {
        jar.add(self.removal(FLOW_STATE_COOKIE))
    }

    fn cookie(&self, name: &'static str, value: String, max_age: TimeDuration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(self.options.path.clone())
            .http_only(self.options.http_only)
            .secure(self.options.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build()
    }

    /// Empty cookie that makes the browser drop `name`. Carries both
    /// `Max-Age=0` and an `Expires` in the past for clients that ignore
    /// `Max-Age`.
    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.cookie(name, String::new(), TimeDuration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }
}
