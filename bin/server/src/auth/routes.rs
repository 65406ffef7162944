//! Authentication routes for login, callback, logout and the profile page.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use sample_app_platform_access::{AuthenticationError, SessionError, UserRecord};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::app::AppState;

/// Query parameters for the OIDC callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    state
        .oidc
        .ensure_provider(&provider)
        .map_err(AuthError::UnknownProvider)?;

    let redirect = state.oidc.authorization_url()?;
    let jar = state
        .sessions
        .save_flow_state(state.sessions.jar(&headers), &redirect.state)?;

    Ok((jar, Redirect::temporary(&redirect.url)))
}

/// Handles the OIDC callback after the user authenticates with the identity
/// provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    state.oidc.ensure_provider(&provider)?;

    if let Some(reason) = query.error {
        let reason = match query.error_description {
            Some(description) => format!("{reason}: {description}"),
            None => reason,
        };
        return Err(AuthenticationError::ProviderError { provider, reason }.into());
    }

    let flow = state
        .sessions
        .load_flow_state(&headers)
        .filter(|flow| flow.provider == provider)
        .ok_or(AuthenticationError::MissingFlowState)?;

    if query.state.as_deref() != Some(flow.csrf_token.as_str()) {
        return Err(AuthenticationError::StateMismatch.into());
    }

    let code = query.code.ok_or(AuthenticationError::MissingCode)?;
    let user = state.oidc.complete(&code, &flow.pkce_verifier).await?;

    let jar = state
        .sessions
        .clear_flow_state(state.sessions.jar(&headers));
    let jar = state.sessions.save(jar, &user)?;

    info!(provider = %user.provider(), "User logged in");

    let profile = format!("{}/profile", state.config.base_url);
    Ok((jar, Redirect::temporary(&profile)))
}

/// Logs out the user by expiring their session cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let jar = state
        .sessions
        .clear_flow_state(state.sessions.jar(&headers));
    let jar = state.sessions.invalidate(jar);

    info!(%provider, "User logged out");

    let home = match state.config.base_url.as_str() {
        "" => "/",
        base => base,
    };
    (jar, Redirect::temporary(home))
}

/// Shows the logged-in user.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, ProfileError> {
    let user = state
        .sessions
        .load(&headers)?
        .ok_or(ProfileError::NotAuthenticated)?;

    let page = render_profile(&state.config.base_url, &user)?;
    Ok(Html(page))
}

fn render_profile(base_url: &str, user: &UserRecord) -> Result<String, SessionError> {
    let data = serde_json::to_string_pretty(user).map_err(|e| SessionError::Encode {
        reason: e.to_string(),
    })?;

    Ok(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>Profile</title></head>\n\
         <body>\n\
         <p>Hello {email}!</p>\n\
         <p><a href=\"{logout}\">Logout</a></p>\n\
         <pre>{data}</pre>\n\
         </body>\n\
         </html>\n",
        email = encode_text(user.email()),
        logout =
            encode_double_quoted_attribute(&format!("{base_url}/logout/{}", user.provider())),
        data = encode_text(&data),
    ))
}

/// Login flow errors.
#[derive(Debug)]
pub enum AuthError {
    /// Login was requested for a provider that is not registered.
    UnknownProvider(AuthenticationError),
    Authentication(AuthenticationError),
    Session(SessionError),
}

impl From<AuthenticationError> for AuthError {
    fn from(e: AuthenticationError) -> Self {
        Self::Authentication(e)
    }
}

impl From<SessionError> for AuthError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownProvider(e) => {
                warn!(error = %e, "Login requested for unknown provider");
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            Self::Authentication(e) => {
                error!(error = %e, "Authentication failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            Self::Session(e) => {
                error!(error = %e, "Session error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

/// Profile page errors.
#[derive(Debug)]
pub enum ProfileError {
    NotAuthenticated,
    Session(SessionError),
}

impl From<SessionError> for ProfileError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => {
                (StatusCode::FORBIDDEN, "User not authenticated.").into_response()
            }
            Self::Session(e) => {
                error!(error = %e, "Failed to read session");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}
