//! OpenFGA authorization client for sample-app.
//!
//! The client talks to the OpenFGA HTTP API of a single store. Only reading
//! authorization models is supported; relationship checks are out of scope.

mod client;
mod error;
mod types;

pub use client::AuthzClient;
pub use error::AuthzError;
pub use types::{AuthorizationModel, ReadAuthorizationModelsResponse};
