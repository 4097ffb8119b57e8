//! Request and response bodies that only exist on the wire

use serde::{Deserialize, Serialize};

/// Body of the federated sign-in exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedTokenRequest {
    pub id_token: String,
}

/// Error body returned by the auth API, e.g. `{"error": "Invalid credentials"}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Human-readable message from an error response body
    ///
    /// Falls back to the raw text when the body is not the JSON error shape.
    pub fn message_from(body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .error
                .or(parsed.message)
                .or_else(|| Some(body.to_string())),
            Err(_) => Some(body.to_string()),
        }
    }
}
