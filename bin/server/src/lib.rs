//! sample-app web server.
//!
//! A small HTTP service demonstrating platform integrations: OIDC login with
//! a signed-cookie session, a test mail send, a Postgres probe, an OpenFGA
//! call, a configuration echo and a Prometheus request counter.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod telemetry;
