//! Listing handlers.
//!
//! Both endpoints run the same linear pass: config lookup, session, full
//! enumeration, normalization. Any failure replaces the whole result with the
//! error envelope; records normalized before the failure are dropped.

use std::sync::Arc;

use axum::extract::State;
use futures::TryStreamExt;

use super::envelope::Listing;
use super::routes::AppState;
use crate::error::ListingError;
use crate::metadata::{KeyMetadataRecord, MetadataRecord, SecretMetadataRecord};
use crate::vault::{KeyItem, RecordStream, SecretItem, VaultSession};

/// A record kind the gateway can enumerate.
trait Listed: MetadataRecord + Send + Sized {
    type Item: Send;

    fn stream(session: &dyn VaultSession) -> RecordStream<'_, Self::Item>;

    fn normalize(item: &Self::Item) -> Self;
}

impl Listed for KeyMetadataRecord {
    type Item = KeyItem;

    fn stream(session: &dyn VaultSession) -> RecordStream<'_, KeyItem> {
        session.list_keys()
    }

    fn normalize(item: &KeyItem) -> Self {
        Self::from(item)
    }
}

impl Listed for SecretMetadataRecord {
    type Item = SecretItem;

    fn stream(session: &dyn VaultSession) -> RecordStream<'_, SecretItem> {
        session.list_secrets()
    }

    fn normalize(item: &SecretItem) -> Self {
        Self::from(item)
    }
}

/// GET /list-keys
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
) -> Result<Listing<KeyMetadataRecord>, ListingError> {
    tracing::info!("Processing request to list Key Vault keys.");
    collect_listing(&state).await
}

/// GET /list-secrets
pub async fn list_secrets(
    State(state): State<Arc<AppState>>,
) -> Result<Listing<SecretMetadataRecord>, ListingError> {
    tracing::info!("Processing request to list Key Vault secrets.");
    collect_listing(&state).await
}

async fn collect_listing<R: Listed>(state: &AppState) -> Result<Listing<R>, ListingError> {
    let result = enumerate::<R>(state).await;
    match &result {
        Ok(listing) => {
            tracing::info!("Found {} {}s in Key Vault.", listing.count(), R::KIND);
        }
        Err(e) => {
            tracing::error!(
                kind = e.kind(),
                "Failed to list {}s from Key Vault: {}",
                R::KIND,
                e
            );
        }
    }
    result
}

async fn enumerate<R: Listed>(state: &AppState) -> Result<Listing<R>, ListingError> {
    let vault_uri = state
        .config
        .vault_uri
        .as_deref()
        .ok_or(ListingError::Configuration)?;

    let session = state.connector.connect(vault_uri).await?;
    let records: Vec<R> = R::stream(session.as_ref())
        .map_ok(|item| R::normalize(&item))
        .try_collect()
        .await?;

    Ok(Listing {
        vault_uri: vault_uri.to_string(),
        records,
    })
}
