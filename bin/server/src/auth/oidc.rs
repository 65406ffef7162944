//! OIDC client implementation using the openidconnect crate.
//!
//! The provider is configured with explicit endpoints rather than
//! discovery. The client is assembled per call from [`OidcConfig`], so an
//! unusable endpoint shows up as a per-request configuration error instead
//! of preventing startup.

use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreUserInfoClaims};
use openidconnect::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    IssuerUrl, JsonWebKeySet, Nonce, OAuth2TokenResponse, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, TokenUrl, UserInfoUrl,
};
use sample_app_platform_access::{AuthenticationError, OidcConfig, UserRecord};
use tracing::{debug, instrument};

use super::session::FlowState;

/// Client with the authorization, token and user-info endpoints set.
type ConfiguredClient =
    CoreClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet, EndpointSet>;

/// OIDC client for authenticating users against the single registered
/// provider.
#[derive(Clone)]
pub struct OidcClient {
    http: reqwest::Client,
    redirect_url: RedirectUrl,
    config: OidcConfig,
}

/// Where to send the user, and what to remember until they come back.
#[derive(Debug, Clone)]
pub struct AuthRedirect {
    pub url: String,
    pub state: FlowState,
}

impl OidcClient {
    /// Registers the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URL is not a valid URL.
    pub fn new(config: OidcConfig, http: reqwest::Client) -> Result<Self, AuthenticationError> {
        let redirect_url = RedirectUrl::new(config.redirect_url().to_string())
            .map_err(|e| configuration("redirect URL", &e))?;

        Ok(Self {
            http,
            redirect_url,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Name under which the provider is registered.
    pub fn provider_name(&self) -> &str {
        self.config.provider_name()
    }

    /// Checks that `provider` names the registered provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotFound` for any other name.
    pub fn ensure_provider(&self, provider: &str) -> Result<(), AuthenticationError> {
        if provider == self.provider_name() {
            Ok(())
        } else {
            Err(AuthenticationError::ProviderNotFound {
                provider: provider.to_string(),
            })
        }
    }

    /// Generates the authorization URL for redirecting the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoints are not valid URLs.
    pub fn authorization_url(&self) -> Result<AuthRedirect, AuthenticationError> {
        let client = self.client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, _nonce) = auth_request.url();

        Ok(AuthRedirect {
            url: auth_url.to_string(),
            state: FlowState {
                provider: self.provider_name().to_string(),
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        })
    }

    /// Exchanges the authorization code and fetches the user-info document.
    ///
    /// A user-info document without an email yields an empty email.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints are misconfigured, the token
    /// exchange fails or the user-info request fails.
    #[instrument(skip_all, fields(provider = %self.provider_name()))]
    pub async fn complete(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<UserRecord, AuthenticationError> {
        let client = self.client()?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthenticationError::TokenExchange {
                reason: e.to_string(),
            })?;
        debug!("Exchanged authorization code");

        let claims: CoreUserInfoClaims = client
            .user_info(token_response.access_token().clone(), None)
            .request_async(&self.http)
            .await
            .map_err(|e| AuthenticationError::UserInfo {
                reason: e.to_string(),
            })?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .unwrap_or_default();

        Ok(UserRecord::new(email, self.provider_name()))
    }

    fn client(&self) -> Result<ConfiguredClient, AuthenticationError> {
        let issuer = match self.config.api_base_url() {
            "" => self.config.authorize_url(),
            base => base,
        };
        let issuer_url =
            IssuerUrl::new(issuer.to_string()).map_err(|e| configuration("issuer URL", &e))?;
        let auth_url = AuthUrl::new(self.config.authorize_url().to_string())
            .map_err(|e| configuration("authorize URL", &e))?;
        let token_url = TokenUrl::new(self.config.token_url().to_string())
            .map_err(|e| configuration("access token URL", &e))?;
        let user_info_url = UserInfoUrl::new(self.config.user_info_url().to_string())
            .map_err(|e| configuration("user info URL", &e))?;

        Ok(CoreClient::new(
            ClientId::new(self.config.client_id().to_string()),
            issuer_url,
            JsonWebKeySet::new(Vec::new()),
        )
        .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_user_info_url(user_info_url)
        .set_redirect_uri(self.redirect_url.clone()))
    }
}

fn configuration(what: &str, e: &dyn std::fmt::Display) -> AuthenticationError {
    AuthenticationError::Configuration {
        reason: format!("invalid {what}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(authorize_url: &str) -> OidcConfig {
        OidcConfig::builder(
            "client".to_string(),
            "secret".to_string(),
            "http://localhost:8080/auth/openid-connect/callback".to_string(),
        )
        .authorize_url(authorize_url.to_string())
        .token_url("https://idp.example.com/token".to_string())
        .user_info_url("https://idp.example.com/userinfo".to_string())
        .scopes_str("openid email")
        .build()
    }

    #[test]
    fn invalid_redirect_url_is_rejected() {
        let config = OidcConfig::builder(
            "client".to_string(),
            "secret".to_string(),
            "not a url".to_string(),
        )
        .build();

        assert!(matches!(
            OidcClient::new(config, reqwest::Client::new()),
            Err(AuthenticationError::Configuration { .. })
        ));
    }

    #[test]
    fn only_the_registered_provider_is_accepted() {
        let client =
            OidcClient::new(config("https://idp.example.com/authorize"), reqwest::Client::new())
                .unwrap();

        assert!(client.ensure_provider("openid-connect").is_ok());
        assert_eq!(
            client.ensure_provider("github"),
            Err(AuthenticationError::ProviderNotFound {
                provider: "github".to_string()
            })
        );
    }

    #[test]
    fn authorization_url_carries_flow_parameters() {
        let client =
            OidcClient::new(config("https://idp.example.com/authorize"), reqwest::Client::new())
                .unwrap();

        let redirect = client.authorization_url().unwrap();
        let url = reqwest::Url::parse(&redirect.url).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert!(redirect.url.starts_with("https://idp.example.com/authorize?"));
        assert_eq!(query["client_id"], "client");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["state"], redirect.state.csrf_token);
        assert_eq!(query["scope"], "openid email");
        assert_eq!(
            query["redirect_uri"],
            "http://localhost:8080/auth/openid-connect/callback"
        );
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(redirect.state.provider, "openid-connect");
    }

    #[test]
    fn unusable_endpoint_is_a_configuration_error() {
        let client = OidcClient::new(config(""), reqwest::Client::new()).unwrap();

        assert!(matches!(
            client.authorization_url(),
            Err(AuthenticationError::Configuration { .. })
        ));
    }
}
