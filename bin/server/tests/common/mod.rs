//! Shared helpers for the server integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use lettre::Message;
use sample_app_integration::{DatabaseProbe, MailError, MailRelay, ProbeError, ProbeReport};
use sample_app_server::app::AppState;
use sample_app_server::config::AppConfig;

pub const BASE_URL: &str = "http://localhost:8080";

/// Configuration with the required variables plus `extra`.
pub fn config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("APP_BASE_URL", BASE_URL),
        ("APP_SECRET_KEY", "integration-test-secret"),
        ("APP_OIDC_REDIRECT_PATH", "/auth/openid-connect/callback"),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
    .collect();

    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }

    AppConfig::from_vars(vars).unwrap()
}

pub fn state(config: AppConfig) -> AppState {
    AppState::from_config(config).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Minimal cookie jar playing the part of a browser.
#[derive(Debug, Default)]
pub struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    pub fn get(&self, uri: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Applies the `Set-Cookie` headers of a response.
    pub fn absorb(&mut self, response: &Response<Body>) {
        for header in response.headers().get_all(SET_COOKIE) {
            let header = header.to_str().unwrap();
            let pair = header.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();

            if header.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn set_raw(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }
}

/// Mail relay that records deliveries or fails every send.
#[derive(Debug, Default)]
pub struct FakeRelay {
    failure: Option<MailError>,
    sent: AtomicUsize,
}

impl FakeRelay {
    pub fn failing(error: MailError) -> Self {
        Self {
            failure: Some(error),
            sent: AtomicUsize::new(0),
        }
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailRelay for FakeRelay {
    async fn send(&self, _message: Message) -> Result<(), MailError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => {
                self.sent.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

/// Database probe with a canned result.
#[derive(Debug)]
pub struct FakeProbe(pub Result<ProbeReport, ProbeError>);

#[async_trait]
impl DatabaseProbe for FakeProbe {
    async fn check(&self) -> Result<ProbeReport, ProbeError> {
        self.0.clone()
    }
}
