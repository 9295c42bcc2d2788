//! Token acquisition for Key Vault access.
//!
//! Sessions ask a [`TokenCredential`] for a bearer token scoped to the vault's
//! audience. In production that is [`AzureIdentityCredential`], which delegates
//! to `azure_identity::DefaultAzureCredential` (environment, managed identity,
//! Azure CLI).

use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential as AzureTokenCredential;
use azure_identity::DefaultAzureCredential;
use chrono::{DateTime, Duration, Utc};

/// Default token audience for the public cloud.
pub const DEFAULT_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Bearer token with its expiry.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// True when the token expires within `margin` from now.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_on - margin <= Utc::now()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{source_name} could not be created: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} failed to retrieve a token: {message}")]
    AuthenticationFailed {
        source_name: &'static str,
        message: String,
    },
}

impl CredentialError {
    pub(crate) fn unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        CredentialError::Unavailable {
            source_name,
            message: message.into(),
        }
    }

    pub(crate) fn failed(source_name: &'static str, message: impl Into<String>) -> Self {
        CredentialError::AuthenticationFailed {
            source_name,
            message: message.into(),
        }
    }
}

/// A source of bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in log and error messages.
    fn name(&self) -> &'static str;

    /// Obtain a token for `scope` (e.g. `https://vault.azure.net/.default`).
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// Ambient Azure identity of the hosting environment.
pub struct AzureIdentityCredential {
    inner: Arc<DefaultAzureCredential>,
}

impl AzureIdentityCredential {
    const NAME: &'static str = "DefaultAzureCredential";

    /// Resolve the credential chain from the process environment.
    pub fn from_env() -> Result<Self, CredentialError> {
        let inner = DefaultAzureCredential::new()
            .map_err(|e| CredentialError::unavailable(Self::NAME, e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl TokenCredential for AzureIdentityCredential {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let token = AzureTokenCredential::get_token(self.inner.as_ref(), &[scope])
            .await
            .map_err(|e| CredentialError::failed(Self::NAME, e.to_string()))?;

        // An unrepresentable expiry forces a refresh on the next request.
        let expires_on =
            DateTime::from_timestamp(token.expires_on.unix_timestamp(), 0).unwrap_or_else(Utc::now);
        Ok(AccessToken::new(token.token.secret(), expires_on))
    }
}

/// Token scope for a vault address.
///
/// Sovereign clouds use a different audience, derived from the vault host
/// (`myvault.vault.azure.cn` → `https://vault.azure.cn/.default`).
pub fn scope_for_vault(vault_uri: &str) -> String {
    let host = url::Url::parse(vault_uri)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    host.as_deref()
        .and_then(|h| h.split_once('.'))
        .map(|(_, domain)| domain)
        .filter(|domain| domain.starts_with("vault.") || domain.starts_with("managedhsm."))
        .map(|domain| format!("https://{}/.default", domain))
        .unwrap_or_else(|| DEFAULT_VAULT_SCOPE.to_string())
}
