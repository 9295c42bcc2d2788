//! Normalized metadata records returned to callers.
//!
//! The mapping from vault wire records is total. Missing attributes become
//! `null` and unknown key types are passed through. Malformed identifiers fall
//! back to plain string splitting, and a vault address that cannot be
//! recovered from the id is reported as `null`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::vault::{Attributes, KeyItem, SecretItem};

/// A normalized record of one resource kind.
pub trait MetadataRecord: Serialize {
    /// Singular kind name used in envelope field names (`key` → `key_count`, `keys`).
    const KIND: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMetadataRecord {
    pub name: String,
    pub id: String,
    pub enabled: Option<bool>,
    pub key_type: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub expires_on: Option<String>,
    pub vault_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretMetadataRecord {
    pub name: String,
    pub id: String,
    pub enabled: Option<bool>,
    pub content_type: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub expires_on: Option<String>,
    pub vault_url: Option<String>,
}

impl MetadataRecord for KeyMetadataRecord {
    const KIND: &'static str = "key";
}

impl MetadataRecord for SecretMetadataRecord {
    const KIND: &'static str = "secret";
}

impl From<&KeyItem> for KeyMetadataRecord {
    fn from(item: &KeyItem) -> Self {
        let resource = ResourceId::parse(&item.kid, "keys");
        let times = Timestamps::from(&item.attributes);
        Self {
            name: resource.name,
            id: item.kid.clone(),
            enabled: item.attributes.enabled,
            key_type: item.kty.as_ref().map(|kty| kty.as_str().to_string()),
            created_on: times.created_on,
            updated_on: times.updated_on,
            expires_on: times.expires_on,
            vault_url: resource.vault_url,
        }
    }
}

impl From<&SecretItem> for SecretMetadataRecord {
    fn from(item: &SecretItem) -> Self {
        let resource = ResourceId::parse(&item.id, "secrets");
        let times = Timestamps::from(&item.attributes);
        Self {
            name: resource.name,
            id: item.id.clone(),
            enabled: item.attributes.enabled,
            content_type: item.content_type.clone(),
            created_on: times.created_on,
            updated_on: times.updated_on,
            expires_on: times.expires_on,
            vault_url: resource.vault_url,
        }
    }
}

struct Timestamps {
    created_on: Option<String>,
    updated_on: Option<String>,
    expires_on: Option<String>,
}

impl From<&Attributes> for Timestamps {
    fn from(attributes: &Attributes) -> Self {
        Self {
            created_on: iso8601(attributes.created),
            updated_on: iso8601(attributes.updated),
            expires_on: iso8601(attributes.exp),
        }
    }
}

/// Render Unix seconds as RFC 3339 with an explicit `+00:00` offset.
///
/// Out-of-range values are reported as absent.
fn iso8601(epoch_secs: Option<i64>) -> Option<String> {
    epoch_secs
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
}

/// Pieces of a vault object identifier such as
/// `https://myvault.vault.azure.net/keys/signing/0123abcd`.
#[derive(Debug, PartialEq, Eq)]
struct ResourceId {
    name: String,
    vault_url: Option<String>,
}

impl ResourceId {
    fn parse(id: &str, collection: &str) -> Self {
        Self::from_url(id, collection).unwrap_or_else(|| Self::from_text(id, collection))
    }

    fn from_url(id: &str, collection: &str) -> Option<Self> {
        let url = Url::parse(id).ok()?;
        let host = url.host_str()?;
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        if segments.next()? != collection {
            return None;
        }
        let name = segments.next()?.to_string();

        let vault_url = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        Some(Self {
            name,
            vault_url: Some(vault_url),
        })
    }

    fn from_text(id: &str, collection: &str) -> Self {
        let marker = format!("/{}/", collection);
        if let Some((vault_url, rest)) = id.split_once(&marker) {
            if let Some(name) = rest.split('/').find(|s| !s.is_empty()) {
                return Self {
                    name: name.to_string(),
                    vault_url: Some(vault_url.to_string()),
                };
            }
        }

        let name = id
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(id)
            .to_string();
        Self {
            name,
            vault_url: None,
        }
    }
}
