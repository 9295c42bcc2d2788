//! Vault session abstraction and the Azure Key Vault implementation.
//!
//! A [`VaultConnector`] opens one [`VaultSession`] per request. Sessions expose
//! one lazily paginated stream per resource kind.

mod client;
mod error;
pub mod models;

pub use client::KeyVaultClient;
pub use error::VaultApiError;
pub use models::{Attributes, KeyItem, KeyType, SecretItem};

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::Config;
use crate::credential::{AzureIdentityCredential, CredentialError, TokenCredential};
use crate::error::ListingError;

/// Lazily fetched records; a failure ends the stream.
pub type RecordStream<'a, T> = BoxStream<'a, Result<T, ListingError>>;

/// A connection to one vault.
pub trait VaultSession: Send + Sync {
    /// Metadata of every key, page by page.
    fn list_keys(&self) -> RecordStream<'_, KeyItem>;

    /// Metadata of every secret, page by page.
    fn list_secrets(&self) -> RecordStream<'_, SecretItem>;
}

/// Opens vault sessions.
#[async_trait]
pub trait VaultConnector: Send + Sync {
    async fn connect(&self, vault_uri: &str) -> Result<Box<dyn VaultSession>, ListingError>;
}

/// Builds the credential for one session.
pub type CredentialFactory =
    Arc<dyn Fn() -> Result<Arc<dyn TokenCredential>, CredentialError> + Send + Sync>;

/// Connector that authenticates with the ambient Azure identity and talks to
/// the Key Vault REST API.
pub struct AzureConnector {
    http: reqwest::Client,
    api_version: String,
    credential_factory: CredentialFactory,
}

impl AzureConnector {
    /// Build the connector and its HTTP client from the gateway config.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(format!("keyvault-lister/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_version: config.api_version.clone(),
            credential_factory: Arc::new(ambient_credential),
        })
    }

    /// Replace how session credentials are built.
    pub fn with_credential_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn TokenCredential>, CredentialError> + Send + Sync + 'static,
    {
        self.credential_factory = Arc::new(factory);
        self
    }
}

fn ambient_credential() -> Result<Arc<dyn TokenCredential>, CredentialError> {
    Ok(Arc::new(AzureIdentityCredential::from_env()?))
}

#[async_trait]
impl VaultConnector for AzureConnector {
    async fn connect(&self, vault_uri: &str) -> Result<Box<dyn VaultSession>, ListingError> {
        // Credentials are resolved per session; nothing is shared across requests.
        let credential = (self.credential_factory)()?;
        let client = KeyVaultClient::new(
            self.http.clone(),
            vault_uri,
            self.api_version.clone(),
            credential,
        )?;
        client.authenticate().await?;
        Ok(Box::new(client))
    }
}
