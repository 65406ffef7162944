//! Handlers for the fixed demonstration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use sample_app_integration::test_message;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::error::HandlerError;

/// `/`
pub async fn hello(State(state): State<Arc<AppState>>) -> &'static str {
    let count = state.metrics.requests().increment();
    debug!(count, "Handled hello");
    "Hello, World!"
}

/// `/send_mail`: sends the fixed test message through the mail relay.
pub async fn send_mail(State(state): State<Arc<AppState>>) -> Result<&'static str, HandlerError> {
    state.metrics.requests().increment();

    let message = test_message()?;
    state.mail.send(message).await.map_err(|e| {
        error!(error = %e, "Failed to send mail");
        HandlerError::from(e)
    })?;

    info!("Sent test mail");
    Ok("Sent")
}

/// `/openfga/list-authorization-models`
pub async fn list_authorization_models(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, HandlerError> {
    state.metrics.requests().increment();

    let client = state
        .authz
        .as_ref()
        .ok_or_else(|| HandlerError::new("OpenFGA client is not configured"))?;

    let response = client.list_authorization_models().await.map_err(|e| {
        error!(error = %e, "Failed to list authorization models");
        HandlerError::new(e.current_context().to_string())
    })?;

    info!(
        models = response.authorization_models.len(),
        "Listed authorization models"
    );
    Ok("Listed authorization models")
}

/// `/env/user-defined-config`: echoes `APP_USER_DEFINED_CONFIG` as JSON.
pub async fn user_defined_config(State(state): State<Arc<AppState>>) -> Json<Option<String>> {
    state.metrics.requests().increment();
    Json(state.config.user_defined_config.clone())
}

/// `/postgresql/migratestatus`
pub async fn migrate_status(State(state): State<Arc<AppState>>) -> &'static str {
    match state.database.check().await {
        Ok(report) => {
            debug!(users = report.user_count, "Database probe succeeded");
            "SUCCESS"
        }
        Err(e) => {
            warn!(error = %e, "Database probe failed");
            "FAILURE"
        }
    }
}
