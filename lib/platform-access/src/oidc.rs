//! OIDC (OpenID Connect) provider configuration.
//!
//! The provider is configured with explicit endpoint URLs rather than
//! discovery: authorization, token and user-info endpoints are all supplied
//! by the deployment environment.

use serde::{Deserialize, Serialize};

/// Name under which the single OIDC provider is registered.
pub const DEFAULT_PROVIDER_NAME: &str = "openid-connect";

/// Configuration for the OIDC identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Name used in `/login/{provider}` style routes.
    #[serde(default = "default_provider_name")]
    provider_name: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// Absolute redirect URL for the OAuth2 callback.
    redirect_url: String,
    /// Authorization endpoint.
    authorize_url: String,
    /// Token endpoint.
    token_url: String,
    /// Base URL of the provider API (informational).
    #[serde(default)]
    api_base_url: String,
    /// User-info endpoint.
    user_info_url: String,
    /// Space-separated scopes to request.
    #[serde(default)]
    scopes: String,
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER_NAME.to_string()
}

impl OidcConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(
        client_id: String,
        client_secret: String,
        redirect_url: String,
    ) -> OidcConfigBuilder {
        OidcConfigBuilder::new(client_id, client_secret, redirect_url)
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the absolute callback URL.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Returns the authorization endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the provider API base URL.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Returns the user-info endpoint.
    #[must_use]
    pub fn user_info_url(&self) -> &str {
        &self.user_info_url
    }

    /// Returns the scopes to request, split on whitespace.
    ///
    /// `openid` is always requested by the authorization flow and is not
    /// repeated here.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split_whitespace()
            .filter(|scope| *scope != "openid")
            .collect()
    }

    /// Returns the raw scopes string.
    #[must_use]
    pub fn scopes_raw(&self) -> &str {
        &self.scopes
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug)]
pub struct OidcConfigBuilder {
    provider_name: String,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    authorize_url: String,
    token_url: String,
    api_base_url: String,
    user_info_url: String,
    scopes: Vec<String>,
}

impl OidcConfigBuilder {
    /// Creates a new builder with the client credentials and callback URL.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            provider_name: default_provider_name(),
            client_id,
            client_secret,
            redirect_url,
            authorize_url: String::new(),
            token_url: String::new(),
            api_base_url: String::new(),
            user_info_url: String::new(),
            scopes: Vec::new(),
        }
    }

    /// Sets the provider name.
    #[must_use]
    pub fn provider_name(mut self, name: String) -> Self {
        self.provider_name = name;
        self
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn authorize_url(mut self, url: String) -> Self {
        self.authorize_url = url;
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    /// Sets the provider API base URL.
    #[must_use]
    pub fn api_base_url(mut self, url: String) -> Self {
        self.api_base_url = url;
        self
    }

    /// Sets the user-info endpoint.
    #[must_use]
    pub fn user_info_url(mut self, url: String) -> Self {
        self.user_info_url = url;
        self
    }

    /// Sets the scopes from a space-separated string.
    #[must_use]
    pub fn scopes_str(mut self, scopes: &str) -> Self {
        self.scopes = scopes.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Builds the `OidcConfig`.
    #[must_use]
    pub fn build(self) -> OidcConfig {
        OidcConfig {
            provider_name: self.provider_name,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_url: self.redirect_url,
            authorize_url: self.authorize_url,
            token_url: self.token_url,
            api_base_url: self.api_base_url,
            user_info_url: self.user_info_url,
            scopes: self.scopes.join(" "),
        }
    }
}
