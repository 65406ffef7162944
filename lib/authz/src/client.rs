//! OpenFGA HTTP client for authorization-model operations.

use crate::error::AuthzError;
use crate::types::ReadAuthorizationModelsResponse;
use rootcause::prelude::Report;
use tracing::{debug, instrument};

/// OpenFGA authorization client bound to a single store.
///
/// The underlying HTTP client is shared with the rest of the application so
/// outbound TLS settings apply uniformly.
#[derive(Clone)]
pub struct AuthzClient {
    http: reqwest::Client,
    api_url: String,
    store_id: String,
    api_token: Option<String>,
}

impl AuthzClient {
    /// Creates a new authorization client.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `api_url` - The OpenFGA HTTP API URL (e.g., "http://localhost:8080")
    /// * `store_id` - The store to operate on
    /// * `api_token` - Optional preshared API token sent as a bearer token
    pub fn new(
        http: reqwest::Client,
        api_url: String,
        store_id: String,
        api_token: Option<String>,
    ) -> Result<Self, Report<AuthzError>> {
        if api_url.trim().is_empty() {
            return Err(AuthzError::InvalidInput {
                details: "api url is required".to_string(),
            }
            .into());
        }
        if store_id.trim().is_empty() {
            return Err(AuthzError::InvalidInput {
                details: "store id is required".to_string(),
            }
            .into());
        }

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            store_id,
            api_token: api_token.filter(|t| !t.is_empty()),
        })
    }

    /// Returns the store this client operates on.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Reads the authorization models of the store.
    #[instrument(skip(self), fields(store_id = %self.store_id))]
    pub async fn list_authorization_models(
        &self,
    ) -> Result<ReadAuthorizationModelsResponse, Report<AuthzError>> {
        let url = format!(
            "{}/stores/{}/authorization-models",
            self.api_url, self.store_id
        );

        let mut request = self.http.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthzError::ConnectionFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(AuthzError::RequestFailed {
                status: status.as_u16(),
                details,
            }
            .into());
        }

        let models: ReadAuthorizationModelsResponse =
            response
                .json()
                .await
                .map_err(|e| AuthzError::InvalidResponse {
                    details: e.to_string(),
                })?;

        debug!(
            count = models.authorization_models.len(),
            "authorization models listed"
        );

        Ok(models)
    }
}
