//! Key Vault REST wire types for the list endpoints.
//!
//! Only the fields the gateway reports are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

/// One page returned by `GET /keys` or `GET /secrets`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page; absent, null or empty on the last page.
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> ListPage<T> {
    /// The next page URL, if the vault reported one.
    pub fn next(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Management attributes shared by keys and secrets.
///
/// Timestamps are Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Key type as reported by the vault.
///
/// Values the gateway does not know about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum KeyType {
    Ec,
    EcHsm,
    Rsa,
    RsaHsm,
    Oct,
    OctHsm,
    Other(String),
}

impl KeyType {
    /// The wire representation of the key type.
    pub fn as_str(&self) -> &str {
        match self {
            KeyType::Ec => "EC",
            KeyType::EcHsm => "EC-HSM",
            KeyType::Rsa => "RSA",
            KeyType::RsaHsm => "RSA-HSM",
            KeyType::Oct => "oct",
            KeyType::OctHsm => "oct-HSM",
            KeyType::Other(raw) => raw,
        }
    }
}

impl From<String> for KeyType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "EC" => KeyType::Ec,
            "EC-HSM" => KeyType::EcHsm,
            "RSA" => KeyType::Rsa,
            "RSA-HSM" => KeyType::RsaHsm,
            "oct" => KeyType::Oct,
            "oct-HSM" => KeyType::OctHsm,
            _ => KeyType::Other(raw),
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry from the key listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyItem {
    pub kid: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub kty: Option<KeyType>,
}

/// Entry from the secret listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretItem {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
}
