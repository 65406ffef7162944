//! External service integrations for sample-app.
//!
//! This crate provides:
//!
//! - **Mail relay**: the [`MailRelay`] seam and its SMTP implementation
//! - **Database probe**: the [`DatabaseProbe`] seam and its Postgres
//!   implementation
//!
//! Both seams are traits so the HTTP layer can be exercised without a live
//! SMTP server or database.

pub mod error;
pub mod mail;
pub mod postgres;

pub use error::{MailError, ProbeError};
pub use mail::{MailRelay, SmtpRelay, SmtpSettings, TransportSecurity, test_message};
pub use postgres::{DatabaseProbe, PostgresProbe, ProbeReport};
