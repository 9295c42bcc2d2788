//! # keyvault-lister
//!
//! Read-only HTTP gateway that lists key and secret metadata from an Azure Key
//! Vault. Key material and secret values are never requested.
//!
//! ## Request flow
//!
//! ```text
//!  GET /list-keys | /list-secrets
//!          │
//!          ▼
//!  Config.vault_uri ── missing ──────────────────────┐
//!          │                                          │
//!          ▼                                          ▼
//!  VaultConnector::connect ── credential error ──► {"error": ...} 500
//!          │                                          ▲
//!          ▼                                          │
//!  VaultSession page stream ── vault error ───────────┘
//!          │
//!          ▼
//!  normalize ─► {"vault_uri", "<kind>_count", "<kind>s"} 200
//! ```
//!
//! ## Modules
//! - `api`: routes, handlers, response envelopes
//! - `vault`: session traits and the Key Vault REST client
//! - `credential`: bearer tokens from the ambient Azure identity
//! - `metadata`: normalized records

pub mod api;
pub mod config;
pub mod credential;
pub mod error;
pub mod metadata;
pub mod util;
pub mod vault;

pub use config::Config;
pub use error::ListingError;
