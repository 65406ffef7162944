//! Centralized server configuration.
//!
//! Configuration is read once at startup from environment variables via the
//! `config` crate. The raw variables are deserialized into
//! [`RawEnvironment`] and then validated into the typed [`AppConfig`].
//! Tests feed an explicit map through [`AppConfig::from_vars`] instead of
//! touching the process environment.

use std::collections::HashMap;
use std::fmt;

use reqwest::Url;
use sample_app_integration::{SmtpSettings, TransportSecurity};
use sample_app_platform_access::{DEFAULT_PROVIDER_NAME, OidcConfig, SessionOptions};
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_METRICS_PORT: u16 = 8081;
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DEFAULT_SERVICE_NAME: &str = "sample-app";

/// Paths served by the application router. The metrics path may not shadow
/// any of them when both servers share a port.
const APPLICATION_PATHS: &[&str] = &[
    "/",
    "/send_mail",
    "/openfga/list-authorization-models",
    "/env/user-defined-config",
    "/postgresql/migratestatus",
    "/profile",
    "/login/{provider}",
    "/logout/{provider}",
    "/auth/{provider}/callback",
];

/// Environment variables as they arrive, before validation.
///
/// Keys are the lowercased variable names, which is how
/// `config::Environment` presents them.
#[derive(Debug, Default, Deserialize)]
struct RawEnvironment {
    app_base_url: Option<String>,
    app_secret_key: Option<String>,
    app_oidc_redirect_path: Option<String>,
    app_port: Option<u16>,
    app_metrics_port: Option<u16>,
    app_metrics_path: Option<String>,
    app_oidc_client_id: Option<String>,
    app_oidc_client_secret: Option<String>,
    app_oidc_authorize_url: Option<String>,
    app_oidc_access_token_url: Option<String>,
    app_oidc_api_base_url: Option<String>,
    app_oidc_user_url: Option<String>,
    app_oidc_scopes: Option<String>,
    app_user_defined_config: Option<String>,
    app_tls_insecure_skip_verify: Option<bool>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_user: Option<String>,
    smtp_domain: Option<String>,
    smtp_password: Option<String>,
    smtp_transport_security: Option<String>,
    postgresql_db_connect_string: Option<String>,
    fga_http_api_url: Option<String>,
    fga_store_id: Option<String>,
    fga_token: Option<String>,
    otel_exporter_otlp_endpoint: Option<String>,
    otel_service_name: Option<String>,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL with any trailing `/` removed.
    pub base_url: String,
    /// Path component of the base URL, `/` when empty.
    pub base_path: String,
    /// `<base>/login/<provider>`.
    pub login_url: String,
    /// Listening port of the application server.
    pub port: u16,
    pub metrics: MetricsConfig,
    pub session: SessionConfig,
    pub oidc: OidcConfig,
    /// Opaque value echoed by `/env/user-defined-config`.
    pub user_defined_config: Option<String>,
    pub smtp: SmtpConfig,
    pub postgres: PostgresConfig,
    pub openfga: OpenFgaConfig,
    pub telemetry: TelemetryConfig,
    /// Disables certificate verification for all outbound TLS.
    pub tls_insecure_skip_verify: bool,
}

/// Metrics exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    pub port: u16,
    pub path: String,
}

/// Session cookie settings.
#[derive(Clone)]
pub struct SessionConfig {
    secret_key: String,
    pub options: SessionOptions,
}

impl SessionConfig {
    /// Secret used to derive the cookie signing key.
    pub fn secret_key(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub domain: Option<String>,
    pub password: Option<String>,
    pub security: TransportSecurity,
}

impl SmtpConfig {
    /// Settings for the mail relay, carrying the outbound TLS policy.
    pub fn relay_settings(&self, accept_invalid_certs: bool) -> SmtpSettings {
        SmtpSettings {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            domain: self.domain.clone(),
            password: self.password.clone(),
            security: self.security,
            accept_invalid_certs,
        }
    }
}

/// Postgres probe settings.
#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    pub connect_string: Option<String>,
}

/// OpenFGA settings.
#[derive(Debug, Clone, Default)]
pub struct OpenFgaConfig {
    pub api_url: Option<String>,
    pub store_id: Option<String>,
    pub token: Option<String>,
}

/// Trace export settings.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// OTLP/HTTP collector endpoint; export is disabled when unset.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(config::Environment::default())
    }

    /// Loads configuration from an explicit variable map.
    ///
    /// Variable names are given as they would appear in the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let source: config::Map<String, String> = vars.into_iter().collect();
        Self::load(config::Environment::default().source(Some(source)))
    }

    fn load(environment: config::Environment) -> Result<Self, ConfigError> {
        let raw: RawEnvironment = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawEnvironment) -> Result<Self, ConfigError> {
        let base_url = required("APP_BASE_URL", raw.app_base_url)?;
        let secret_key = required("APP_SECRET_KEY", raw.app_secret_key)?;
        let redirect_path = required("APP_OIDC_REDIRECT_PATH", raw.app_oidc_redirect_path)?;

        let parsed = Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            var: "APP_BASE_URL".to_string(),
            reason: e.to_string(),
        })?;
        let base_path = match parsed.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        let provider_name = DEFAULT_PROVIDER_NAME.to_string();
        let login_url = format!("{base_url}/login/{provider_name}");
        let redirect_url = format!("{base_url}{redirect_path}");

        let port = raw.app_port.unwrap_or(DEFAULT_PORT);
        let metrics = MetricsConfig {
            port: raw.app_metrics_port.unwrap_or(DEFAULT_METRICS_PORT),
            path: non_empty(raw.app_metrics_path)
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string()),
        };
        validate_metrics_path(&metrics.path, metrics.port == port).map_err(|reason| {
            ConfigError::Invalid {
                var: "APP_METRICS_PATH".to_string(),
                reason,
            }
        })?;

        let oidc = OidcConfig::builder(
            raw.app_oidc_client_id.unwrap_or_default(),
            raw.app_oidc_client_secret.unwrap_or_default(),
            redirect_url,
        )
        .provider_name(provider_name)
        .authorize_url(raw.app_oidc_authorize_url.unwrap_or_default())
        .token_url(raw.app_oidc_access_token_url.unwrap_or_default())
        .api_base_url(raw.app_oidc_api_base_url.unwrap_or_default())
        .user_info_url(raw.app_oidc_user_url.unwrap_or_default())
        .scopes_str(raw.app_oidc_scopes.as_deref().unwrap_or_default())
        .build();

        let smtp = SmtpConfig {
            host: non_empty(raw.smtp_host),
            port: raw.smtp_port,
            user: raw.smtp_user,
            domain: raw.smtp_domain,
            password: raw.smtp_password,
            security: raw
                .smtp_transport_security
                .as_deref()
                .map(TransportSecurity::parse)
                .unwrap_or_default(),
        };

        let telemetry = TelemetryConfig {
            otlp_endpoint: non_empty(raw.otel_exporter_otlp_endpoint),
            service_name: non_empty(raw.otel_service_name)
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        };

        Ok(Self {
            base_url,
            base_path: base_path.clone(),
            login_url,
            port,
            metrics,
            session: SessionConfig {
                secret_key,
                options: SessionOptions::new(base_path),
            },
            oidc,
            user_defined_config: raw.app_user_defined_config,
            smtp,
            postgres: PostgresConfig {
                connect_string: non_empty(raw.postgresql_db_connect_string),
            },
            openfga: OpenFgaConfig {
                api_url: non_empty(raw.fga_http_api_url),
                store_id: non_empty(raw.fga_store_id),
                token: non_empty(raw.fga_token),
            },
            telemetry,
            tls_insecure_skip_verify: raw.app_tls_insecure_skip_verify.unwrap_or(false),
        })
    }
}

/// The metrics path is mounted as a literal route, so it must not contain
/// router captures or wildcards. On a shared port it must also stay clear of
/// the application routes, including the ones a capture would match.
fn validate_metrics_path(path: &str, shared_port: bool) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err("must start with '/'".to_string());
    }
    if path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with(['*', ':']))
    {
        return Err(format!("{path} must be a literal path without captures"));
    }
    if shared_port && APPLICATION_PATHS.iter().any(|route| route_matches(route, path)) {
        return Err(format!("{path} is already served by the application"));
    }
    Ok(())
}

/// Whether `path` would be routed to `route`, treating `{name}` segments as
/// single-segment captures.
fn route_matches(route: &str, path: &str) -> bool {
    let route: Vec<&str> = route.split('/').collect();
    let path: Vec<&str> = path.split('/').collect();
    route.len() == path.len()
        && route.iter().zip(&path).all(|(r, p)| {
            (r.starts_with('{') && r.ends_with('}') && !p.is_empty()) || r == p
        })
}

fn required(var: &str, value: Option<String>) -> Result<String, ConfigError> {
    non_empty(value).ok_or_else(|| ConfigError::Missing {
        var: var.to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
