//! The internal-error class of request dispatch.
//!
//! Protocol misuse (bad verbs, expired tokens, unknown identifiers) is
//! never a Rust error: it accumulates in the response envelope. The
//! variants here are the failures a transport must map onto its own
//! status codes instead — access denial and infrastructure faults from
//! the collaborating stores.

use thiserror::Error;

use crate::repository::RepositoryError;
use crate::token_store::TokenStoreError;

/// Faults that abort dispatch without producing a protocol envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The caller failed the endpoint-level access gate. Transports
    /// answer with their forbidden status; no envelope is built.
    #[error("caller is not authorised to access the repository")]
    AccessDenied,

    /// The record repository failed mid-dispatch.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The token store failed mid-dispatch.
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl DispatchError {
    /// Whether the fault is the transport-level access denial.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied)
    }

    /// Whether the fault is transient infrastructure the caller may
    /// retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Repository(RepositoryError::Timeout { .. })
                | Self::TokenStore(TokenStoreError::Unavailable { .. })
        )
    }
}
