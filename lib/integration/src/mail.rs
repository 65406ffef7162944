//! SMTP mail relay.
//!
//! The relay opens a fresh SMTP connection for every message. Transport
//! security follows `SMTP_TRANSPORT_SECURITY`:
//! - `none` (or anything unrecognised): plain SMTP, no authentication
//! - `starttls`: plain connection upgraded with STARTTLS
//! - `tls`: implicit TLS with PLAIN authentication

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use crate::error::MailError;

const TEST_FROM: &str = "tester@example.com";
const TEST_TO: &str = "test@example.com";
const TEST_SUBJECT: &str = "hello";
const TEST_BODY: &str = "Hello world!";

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport security mode for the SMTP connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportSecurity {
    /// Plain SMTP.
    #[default]
    None,
    /// Upgrade with STARTTLS.
    StartTls,
    /// Implicit TLS with authentication.
    Tls,
}

impl TransportSecurity {
    /// Parses the `SMTP_TRANSPORT_SECURITY` value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Self::StartTls,
            "tls" => Self::Tls,
            _ => Self::None,
        }
    }
}

/// Settings for the SMTP relay.
#[derive(Debug, Clone, Default)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub domain: Option<String>,
    pub password: Option<String>,
    pub security: TransportSecurity,
    /// Accept invalid server certificates during the TLS handshake.
    pub accept_invalid_certs: bool,
}

impl SmtpSettings {
    /// Login name in `user@domain` form.
    #[must_use]
    pub fn username(&self) -> String {
        format!(
            "{}@{}",
            self.user.as_deref().unwrap_or_default(),
            self.domain.as_deref().unwrap_or_default()
        )
    }
}

/// Builds the fixed test message.
///
/// # Errors
///
/// Returns an error if the message cannot be assembled.
pub fn test_message() -> Result<Message, MailError> {
    let invalid = |e: &dyn std::fmt::Display| MailError::InvalidMessage {
        reason: e.to_string(),
    };

    let from: Mailbox = TEST_FROM.parse().map_err(|e| invalid(&e))?;
    let to: Mailbox = TEST_TO.parse().map_err(|e| invalid(&e))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(TEST_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(TEST_BODY.to_string())
        .map_err(|e| invalid(&e))
}

/// Something that can deliver a message.
#[async_trait]
pub trait MailRelay: Send + Sync {
    /// Delivers the message.
    async fn send(&self, message: Message) -> Result<(), MailError>;
}

/// Mail relay speaking SMTP.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    settings: SmtpSettings,
}

impl SmtpRelay {
    /// Creates a relay from settings.
    #[must_use]
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Returns the relay settings.
    #[must_use]
    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let host = self
            .settings
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MailError::NotConfigured {
                setting: "SMTP_HOST".to_string(),
            })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .timeout(Some(SMTP_TIMEOUT));
        if let Some(port) = self.settings.port {
            builder = builder.port(port);
        }

        builder = match self.settings.security {
            TransportSecurity::None => builder,
            TransportSecurity::StartTls => builder.tls(Tls::Required(self.tls_parameters(host)?)),
            TransportSecurity::Tls => builder
                .tls(Tls::Wrapper(self.tls_parameters(host)?))
                .credentials(Credentials::new(
                    self.settings.username(),
                    self.settings.password.clone().unwrap_or_default(),
                ))
                .authentication(vec![Mechanism::Plain]),
        };

        Ok(builder.build())
    }

    fn tls_parameters(&self, host: &str) -> Result<TlsParameters, MailError> {
        TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(self.settings.accept_invalid_certs)
            .build()
            .map_err(|e| MailError::Tls {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    #[instrument(skip(self, message), fields(host = ?self.settings.host, security = ?self.settings.security))]
    async fn send(&self, message: Message) -> Result<(), MailError> {
        let transport = self.transport()?;
        let response = transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport {
                reason: e.to_string(),
            })?;
        debug!(code = %response.code(), "message relayed");
        Ok(())
    }
}
