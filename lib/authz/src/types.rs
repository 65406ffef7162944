//! OpenFGA API response types.

use serde::{Deserialize, Serialize};

/// An authorization model stored in OpenFGA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Model identifier (a ULID).
    pub id: String,
    /// Schema version, e.g. "1.1".
    #[serde(default)]
    pub schema_version: String,
    /// Type definitions, kept opaque.
    #[serde(default)]
    pub type_definitions: Vec<serde_json::Value>,
}

/// Response of `GET /stores/{store_id}/authorization-models`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadAuthorizationModelsResponse {
    /// Models on this page, newest first.
    #[serde(default)]
    pub authorization_models: Vec<AuthorizationModel>,
    /// Token for the next page; empty when there are no more pages.
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_api_payload() {
        let json = r#"{
            "authorization_models": [
                {"id": "01HVMMBCMGZNT3SED4Z17ECXCA", "schema_version": "1.1", "type_definitions": [{"type": "user"}]}
            ],
            "continuation_token": ""
        }"#;

        let response: ReadAuthorizationModelsResponse =
            serde_json::from_str(json).expect("deserialize");

        assert_eq!(response.authorization_models.len(), 1);
        assert_eq!(response.authorization_models[0].schema_version, "1.1");
        assert_eq!(response.continuation_token.as_deref(), Some(""));
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let response: ReadAuthorizationModelsResponse =
            serde_json::from_str("{}").expect("deserialize");
        assert!(response.authorization_models.is_empty());
        assert!(response.continuation_token.is_none());
    }
}
