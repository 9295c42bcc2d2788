//! HTTP API for the Key Vault lister.
//!
//! ## Endpoints
//!
//! - `GET /list-keys` - Metadata of every key in the vault
//! - `GET /list-secrets` - Metadata of every secret in the vault
//! - `GET /api/list-keys`, `GET /api/list-secrets` - Same, under the platform route prefix
//! - `GET /health` - Health check

mod auth;
pub mod envelope;
mod listing;
mod routes;
#[cfg(test)]
pub(crate) mod test_support;

pub use envelope::{ErrorEnvelope, Listing};
pub use routes::{router, serve, AppState};
