//! Failure kinds of a listing request.
//!
//! Every kind collapses to the same `{"error": ...}` body with status 500 at the
//! HTTP boundary; the distinction is kept for logging and tests.

use crate::config::VAULT_URI_ENV;
use crate::credential::CredentialError;
use crate::vault::VaultApiError;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// The vault address is not configured.
    #[error("{} environment variable is not set.", VAULT_URI_ENV)]
    Configuration,

    /// No credential could be obtained for the vault.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Opening the session or enumerating records failed.
    #[error(transparent)]
    VaultAccess(#[from] VaultApiError),
}

impl ListingError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ListingError::Configuration => "configuration",
            ListingError::Credential(_) => "credential",
            ListingError::VaultAccess(_) => "vault_access",
        }
    }
}
