//! Key Vault REST client for the metadata list endpoints.
//!
//! Listing is paginated: each page carries a `nextLink` that is followed until
//! the vault stops returning one. Pages are fetched lazily as the stream is
//! polled, and a fresh stream starts again from the first page.

use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use url::Url;

use super::error::VaultApiError;
use super::models::{KeyItem, ListPage, SecretItem};
use super::{RecordStream, VaultSession};
use crate::credential::{scope_for_vault, AccessToken, TokenCredential};
use crate::error::ListingError;

/// Refresh the cached token when it has less than this left.
const TOKEN_REFRESH_MARGIN_MINUTES: i64 = 5;

/// Vault REST API client bound to one vault and one credential.
pub struct KeyVaultClient {
    http: reqwest::Client,
    vault_url: Url,
    api_version: String,
    scope: String,
    credential: Arc<dyn TokenCredential>,
    token: Mutex<Option<AccessToken>>,
}

impl KeyVaultClient {
    /// Create a client for `vault_uri`.
    ///
    /// # Errors
    ///
    /// Returns `VaultApiError::InvalidAddress` if the address is not an
    /// absolute http(s) URL.
    pub fn new(
        http: reqwest::Client,
        vault_uri: &str,
        api_version: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, VaultApiError> {
        let trimmed = vault_uri.trim().trim_end_matches('/');
        let vault_url = Url::parse(trimmed)
            .map_err(|e| VaultApiError::InvalidAddress(vault_uri.to_string(), e.to_string()))?;
        if !matches!(vault_url.scheme(), "https" | "http") || vault_url.host_str().is_none() {
            return Err(VaultApiError::InvalidAddress(
                vault_uri.to_string(),
                "expected an http(s) URL with a host".to_string(),
            ));
        }

        Ok(Self {
            http,
            scope: scope_for_vault(trimmed),
            vault_url,
            api_version: api_version.into(),
            credential,
            token: Mutex::new(None),
        })
    }

    /// Acquire the first token up front so credential problems surface before
    /// any listing call.
    pub async fn authenticate(&self) -> Result<(), ListingError> {
        self.bearer().await.map(|_| ())
    }

    async fn bearer(&self) -> Result<String, ListingError> {
        let mut cached = self.token.lock().await;
        let margin = Duration::minutes(TOKEN_REFRESH_MARGIN_MINUTES);
        if let Some(token) = cached.as_ref().filter(|t| !t.expires_within(margin)) {
            return Ok(token.token.clone());
        }

        tracing::debug!(
            "Requesting token for {} via {}",
            self.scope,
            self.credential.name()
        );
        let fresh = self.credential.get_token(&self.scope).await?;
        let value = fresh.token.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.vault_url.clone();
        url.set_path(&format!("/{}", collection));
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        url
    }

    /// Validate a `nextLink` before the bearer token is sent to it.
    fn next_page_url(&self, link: &str) -> Result<Url, VaultApiError> {
        let mut url = Url::parse(link)
            .map_err(|e| VaultApiError::Decode(format!("invalid nextLink {}: {}", link, e)))?;

        if url.origin() != self.vault_url.origin() {
            return Err(VaultApiError::Decode(format!(
                "nextLink {} points outside the vault",
                link
            )));
        }

        if !url.query_pairs().any(|(k, _)| k == "api-version") {
            url.query_pairs_mut()
                .append_pair("api-version", &self.api_version);
        }
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(&self, url: Url) -> Result<ListPage<T>, ListingError> {
        let token = self.bearer().await?;

        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(VaultApiError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(VaultApiError::Network)?;

        if !status.is_success() {
            return Err(VaultApiError::from_status(status.as_u16(), &body).into());
        }

        serde_json::from_str(&body)
            .map_err(|e| VaultApiError::Decode(e.to_string()).into())
    }

    fn list<T>(&self, collection: &'static str) -> RecordStream<'_, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Box::pin(async_stream::stream! {
            let mut next = Some(self.collection_url(collection));
            let mut pages = 0usize;

            while let Some(url) = next.take() {
                let page: ListPage<T> = match self.get_page(url).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                pages += 1;

                let following = page.next().map(|link| self.next_page_url(link));
                for item in page.value {
                    yield Ok(item);
                }

                match following {
                    Some(Ok(url)) => next = Some(url),
                    Some(Err(e)) => {
                        yield Err(ListingError::from(e));
                        return;
                    }
                    None => {}
                }
            }

            tracing::debug!("Listed {} from {} page(s)", collection, pages);
        })
    }
}

impl VaultSession for KeyVaultClient {
    fn list_keys(&self) -> RecordStream<'_, KeyItem> {
        self.list("keys")
    }

    fn list_secrets(&self) -> RecordStream<'_, SecretItem> {
        self.list("secrets")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::credential::tests::StaticCredential;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use futures::TryStreamExt;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    #[derive(Clone)]
    struct FakeVault {
        base: String,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer test-token")
    }

    async fn keys(
        State(vault): State<FakeVault>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": { "code": "Unauthorized", "message": "no token" } })),
            );
        }
        let body = match query.get("$skiptoken").map(String::as_str) {
            None => serde_json::json!({
                "value": [
                    { "kid": format!("{}/keys/alpha", vault.base), "attributes": { "enabled": true } },
                    { "kid": format!("{}/keys/bravo", vault.base), "attributes": { "enabled": false } }
                ],
                "nextLink": format!("{}/keys?api-version=7.4&$skiptoken=page2", vault.base)
            }),
            Some("page2") => serde_json::json!({
                "value": [
                    { "kid": format!("{}/keys/charlie", vault.base), "attributes": { "enabled": true } }
                ],
                "nextLink": null
            }),
            Some(_) => serde_json::json!({ "value": [] }),
        };
        (StatusCode::OK, Json(body))
    }

    async fn secrets(
        State(vault): State<FakeVault>,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        match query.get("$skiptoken").map(String::as_str) {
            None => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "value": [
                        { "id": format!("{}/secrets/one", vault.base) },
                        { "id": format!("{}/secrets/two", vault.base) }
                    ],
                    "nextLink": format!("{}/secrets?$skiptoken=broken", vault.base)
                })),
            ),
            Some(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": { "code": "ServiceUnavailable", "message": "try later" }
                })),
            ),
        }
    }

    /// Serve a fake vault on a loopback port; it accepts only `Bearer test-token`.
    pub(crate) async fn spawn_fake_vault() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = Router::new()
            .route("/keys", get(keys))
            .route("/secrets", get(secrets))
            .with_state(FakeVault { base: base.clone() });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    fn client(base: &str, credential: StaticCredential) -> KeyVaultClient {
        KeyVaultClient::new(
            reqwest::Client::new(),
            base,
            "7.4",
            Arc::new(credential),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn follows_next_links_in_order() {
        let base = spawn_fake_vault().await;
        let credential = StaticCredential::new("test-token");
        let calls = Arc::clone(&credential.calls);
        let client = client(&base, credential);

        let items: Vec<KeyItem> = client.list_keys().try_collect().await.unwrap();
        let names: Vec<&str> = items
            .iter()
            .map(|k| k.kid.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn authenticate_caches_the_token() {
        let credential = StaticCredential::new("test-token");
        let calls = Arc::clone(&credential.calls);
        let client = client("https://example.vault", credential);

        tokio_test::assert_ok!(client.authenticate().await);
        tokio_test::assert_ok!(client.authenticate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn listing_restarts_from_the_first_page() {
        let base = spawn_fake_vault().await;
        let client = client(&base, StaticCredential::new("test-token"));

        let first: Vec<KeyItem> = client.list_keys().try_collect().await.unwrap();
        let second: Vec<KeyItem> = client.list_keys().try_collect().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rejected_token_is_vault_access_error() {
        let base = spawn_fake_vault().await;
        let client = client(&base, StaticCredential::new("wrong-token"));

        let err = client
            .list_keys()
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ListingError::VaultAccess(VaultApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn failure_on_later_page_surfaces_after_yielded_items() {
        let base = spawn_fake_vault().await;
        let client = client(&base, StaticCredential::new("test-token"));

        let mut stream = client.list_secrets();
        let mut seen = 0;
        let err = loop {
            match stream.try_next().await {
                Ok(Some(_)) => seen += 1,
                Ok(None) => panic!("listing should fail on the second page"),
                Err(e) => break e,
            }
        };
        assert_eq!(seen, 2);
        assert!(err.to_string().contains("ServiceUnavailable: try later"));
    }

    #[tokio::test]
    async fn foreign_next_link_is_rejected() {
        let client = client("https://example.vault", StaticCredential::new("t"));
        assert!(client
            .next_page_url("https://elsewhere.example/keys?api-version=7.4")
            .is_err());
        let url = client
            .next_page_url("https://example.vault/keys?$skiptoken=x")
            .unwrap();
        assert!(url.query().unwrap().contains("api-version=7.4"));
    }

    #[test]
    fn invalid_address_is_rejected() {
        let result = KeyVaultClient::new(
            reqwest::Client::new(),
            "not a url",
            "7.4",
            Arc::new(StaticCredential::new("t")),
        );
        assert!(matches!(result, Err(VaultApiError::InvalidAddress(_, _))));
    }

    #[test]
    fn collection_url_carries_api_version() {
        let client = client("https://example.vault/", StaticCredential::new("t"));
        assert_eq!(
            client.collection_url("secrets").as_str(),
            "https://example.vault/secrets?api-version=7.4"
        );
    }
}
