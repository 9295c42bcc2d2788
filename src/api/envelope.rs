//! Response envelopes.
//!
//! Success: `{"vault_uri": ..., "<kind>_count": N, "<kind>s": [...]}` with 200.
//! Failure: `{"error": "..."}` with 500, whatever the failure kind.
//! Bodies are pretty-printed JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::error::ListingError;
use crate::metadata::MetadataRecord;

/// Complete listing of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<R> {
    pub vault_uri: String,
    pub records: Vec<R>,
}

impl<R> Listing<R> {
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

impl<R: MetadataRecord> Serialize for Listing<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("vault_uri", &self.vault_uri)?;
        map.serialize_entry(&format!("{}_count", R::KIND), &self.records.len())?;
        map.serialize_entry(&format!("{}s", R::KIND), &self.records)?;
        map.end()
    }
}

/// `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Pretty-printed JSON body with an explicit status.
pub struct PrettyJson<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        let PrettyJson(status, value) = self;
        match serde_json::to_string_pretty(&value) {
            Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response body: {}", e);
                let body = serde_json::json!({ "error": e.to_string() }).to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
        }
    }
}

impl<R: MetadataRecord> IntoResponse for Listing<R> {
    fn into_response(self) -> Response {
        PrettyJson(StatusCode::OK, self).into_response()
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        PrettyJson(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope::new(self.to_string()),
        )
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{KeyMetadataRecord, SecretMetadataRecord};

    #[test]
    fn empty_listing_uses_kind_field_names() {
        let listing: Listing<KeyMetadataRecord> = Listing {
            vault_uri: "https://example.vault".to_string(),
            records: vec![],
        };
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            serde_json::json!({ "vault_uri": "https://example.vault", "key_count": 0, "keys": [] })
        );
    }

    #[test]
    fn secret_listing_field_order() {
        let listing: Listing<SecretMetadataRecord> = Listing {
            vault_uri: "https://example.vault".to_string(),
            records: vec![],
        };
        let text = serde_json::to_string(&listing).unwrap();
        assert_eq!(
            text,
            r#"{"vault_uri":"https://example.vault","secret_count":0,"secrets":[]}"#
        );
    }

    #[test]
    fn every_error_kind_is_500() {
        let response = ListingError::Configuration.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let response =
            ListingError::from(crate::vault::VaultApiError::from_status(403, "")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
