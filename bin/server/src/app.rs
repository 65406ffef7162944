//! Application state and routers.

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use reqwest::redirect::Policy;
use sample_app_authz::AuthzClient;
use sample_app_integration::{DatabaseProbe, MailRelay, PostgresProbe, SmtpRelay};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{self, CookieSessionStore, OidcClient};
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::handlers;
use crate::metrics::{Metrics, serve_metrics};

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub sessions: CookieSessionStore,
    pub oidc: OidcClient,
    pub mail: Arc<dyn MailRelay>,
    pub database: Arc<dyn DatabaseProbe>,
    /// Absent when OpenFGA is not configured.
    pub authz: Option<AuthzClient>,
    pub metrics: Metrics,
}

impl AppState {
    /// Builds the state and its collaborators from configuration.
    ///
    /// Nothing here opens a connection; collaborators connect on use.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the OIDC
    /// provider cannot be registered.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let http = http_client(config.tls_insecure_skip_verify)?;

        let oidc = OidcClient::new(config.oidc.clone(), http.clone()).map_err(|e| {
            StartupError::Oidc {
                reason: e.to_string(),
            }
        })?;

        let sessions =
            CookieSessionStore::new(config.session.secret_key(), config.session.options.clone());

        let mail: Arc<dyn MailRelay> = Arc::new(SmtpRelay::new(
            config.smtp.relay_settings(config.tls_insecure_skip_verify),
        ));
        let database: Arc<dyn DatabaseProbe> =
            Arc::new(PostgresProbe::new(config.postgres.connect_string.clone()));

        let authz = authz_client(&config, http);

        Ok(Self {
            config,
            sessions,
            oidc,
            mail,
            database,
            authz,
            metrics: Metrics::new(),
        })
    }

    /// Replaces the mail relay.
    pub fn with_mail_relay(mut self, mail: Arc<dyn MailRelay>) -> Self {
        self.mail = mail;
        self
    }

    /// Replaces the database probe.
    pub fn with_database_probe(mut self, database: Arc<dyn DatabaseProbe>) -> Self {
        self.database = database;
        self
    }
}

/// Shared outbound HTTP client for the identity provider and OpenFGA.
///
/// Redirects are not followed, which the OIDC token exchange requires.
fn http_client(insecure: bool) -> Result<reqwest::Client, StartupError> {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(|e| StartupError::HttpClient {
            reason: e.to_string(),
        })
}

fn authz_client(config: &AppConfig, http: reqwest::Client) -> Option<AuthzClient> {
    let Some(api_url) = config.openfga.api_url.clone() else {
        info!("FGA_HTTP_API_URL not set; OpenFGA endpoint disabled");
        return None;
    };

    match AuthzClient::new(
        http,
        api_url,
        config.openfga.store_id.clone().unwrap_or_default(),
        config.openfga.token.clone(),
    ) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "Failed to create OpenFGA client");
            None
        }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(handlers::hello))
        .route("/send_mail", any(handlers::send_mail))
        .route(
            "/openfga/list-authorization-models",
            any(handlers::list_authorization_models),
        )
        .route("/env/user-defined-config", any(handlers::user_defined_config))
        .route("/postgresql/migratestatus", any(handlers::migrate_status))
        .route("/auth/{provider}/callback", get(auth::callback))
        .route("/logout/{provider}", get(auth::logout))
        .route("/login/{provider}", get(auth::login))
        .route("/profile", get(auth::profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the router serving the Prometheus exposition at `path`.
pub fn metrics_router(metrics: Metrics, path: &str) -> Router {
    Router::new()
        .route(path, get(serve_metrics))
        .with_state(metrics)
}

/// Builds the router for the main listener, mounting the metrics route on
/// it when both servers share a port.
pub fn main_router(state: Arc<AppState>) -> Router {
    let shared_port = state.config.metrics.port == state.config.port;
    let metrics = state.metrics.clone();
    let metrics_path = state.config.metrics.path.clone();

    let app = router(state);
    if shared_port {
        app.merge(metrics_router(metrics, &metrics_path))
    } else {
        app
    }
}
