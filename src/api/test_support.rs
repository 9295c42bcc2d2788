//! In-memory vault and a helper that serves the router on a loopback port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::routes::{router, AppState};
use crate::config::Config;
use crate::credential::CredentialError;
use crate::error::ListingError;
use crate::vault::{
    KeyItem, RecordStream, SecretItem, VaultApiError, VaultConnector, VaultSession,
};

#[derive(Clone, Default)]
pub(crate) struct StubSession {
    keys: Vec<KeyItem>,
    secrets: Vec<SecretItem>,
    /// Fail with a 503 once this many records have been yielded.
    fail_after: Option<usize>,
}

impl StubSession {
    fn yield_items<T: Clone + Send + Sync + 'static>(&self, items: &[T]) -> RecordStream<'_, T> {
        let items = items.to_vec();
        let fail_after = self.fail_after;
        Box::pin(async_stream::stream! {
            for (yielded, item) in items.into_iter().enumerate() {
                if fail_after == Some(yielded) {
                    yield Err(ListingError::from(VaultApiError::from_status(
                        503,
                        r#"{"error":{"code":"ServiceUnavailable","message":"throttled mid-listing"}}"#,
                    )));
                    return;
                }
                yield Ok(item);
            }
        })
    }
}

impl VaultSession for StubSession {
    fn list_keys(&self) -> RecordStream<'_, KeyItem> {
        self.yield_items(&self.keys)
    }

    fn list_secrets(&self) -> RecordStream<'_, SecretItem> {
        self.yield_items(&self.secrets)
    }
}

/// Connector handing out copies of one [`StubSession`] and counting connects.
#[derive(Clone, Default)]
pub(crate) struct StubConnector {
    session: StubSession,
    reject_credentials: bool,
    pub connects: Arc<AtomicUsize>,
}

impl StubConnector {
    pub(crate) fn with_keys(mut self, keys: Vec<KeyItem>) -> Self {
        self.session.keys = keys;
        self
    }

    pub(crate) fn with_secrets(mut self, secrets: Vec<SecretItem>) -> Self {
        self.session.secrets = secrets;
        self
    }

    pub(crate) fn failing_after(mut self, records: usize) -> Self {
        self.session.fail_after = Some(records);
        self
    }

    pub(crate) fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }
}

#[async_trait]
impl VaultConnector for StubConnector {
    async fn connect(&self, _vault_uri: &str) -> Result<Box<dyn VaultSession>, ListingError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject_credentials {
            return Err(CredentialError::failed(
                "DefaultAzureCredential",
                "no credential source is configured",
            )
            .into());
        }
        Ok(Box::new(self.session.clone()))
    }
}

/// Serve the gateway router on `127.0.0.1:0` and return its base URL.
pub(crate) async fn spawn_gateway(
    config: Config,
    connector: impl VaultConnector + 'static,
) -> String {
    let state = Arc::new(AppState {
        config,
        connector: Arc::new(connector),
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
