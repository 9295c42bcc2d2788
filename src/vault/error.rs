//! Vault API error types.
//!
//! Non-success statuses are classified by HTTP status code. The service's own
//! error message is carried along when the response body contains one.

use serde::Deserialize;

/// Error from Key Vault REST calls.
#[derive(Debug, thiserror::Error)]
pub enum VaultApiError {
    #[error("network error communicating with Key Vault: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Key Vault rejected the credential (HTTP 401): {0}")]
    Unauthorized(String),

    #[error("caller is not permitted to list this vault (HTTP 403): {0}")]
    Forbidden(String),

    #[error("Key Vault resource not found (HTTP 404): {0}")]
    NotFound(String),

    #[error("Key Vault request throttled (HTTP 429): {0}")]
    RateLimited(String),

    #[error("Key Vault server error (HTTP {0}): {1}")]
    ServerError(u16, String),

    #[error("unexpected Key Vault response (HTTP {0}): {1}")]
    UnexpectedStatus(u16, String),

    #[error("failed to decode Key Vault response: {0}")]
    Decode(String),

    #[error("invalid vault address {0}: {1}")]
    InvalidAddress(String, String),
}

impl VaultApiError {
    /// Build an error from a non-success status and its response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = service_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                "no response body".to_string()
            } else {
                crate::util::truncate_for_log(body.trim(), 300).to_string()
            }
        });

        match status {
            401 => VaultApiError::Unauthorized(message),
            403 => VaultApiError::Forbidden(message),
            404 => VaultApiError::NotFound(message),
            429 => VaultApiError::RateLimited(message),
            500..=599 => VaultApiError::ServerError(status, message),
            _ => VaultApiError::UnexpectedStatus(status, message),
        }
    }

}

/// Key Vault error body: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn service_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.error.code, parsed.error.message) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        (None, Some(message)) => Some(message),
        (Some(code), None) => Some(code),
        (None, None) => None,
    }
}
