//! Persistence of resumption tokens between harvest requests.
//!
//! The store is the only state shared across protocol requests. Expired
//! tokens are pruned lazily by the dispatcher when a lookup finds them;
//! there is no background sweep, because token volume is bounded by
//! harvest traffic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use harvest_types::ResumptionToken;
use thiserror::Error;

/// Infrastructure faults surfaced by token-store implementations.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The backing store could not be reached.
    #[error("token store unavailable: {message}")]
    Unavailable { message: String },

    /// The store's own invariants broke (for example a poisoned lock).
    #[error("internal token store error: {message}")]
    Internal { message: String },
}

impl TokenStoreError {
    /// Creates an unavailability error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result alias for token-store operations.
pub type TokenStoreResult<T> = Result<T, TokenStoreError>;

/// Persistence contract for resumption tokens.
///
/// `next_token_id` must never hand the same id to two callers, even
/// concurrently; how an implementation guarantees that (atomic counter,
/// transactional increment, or collision-resistant random ids) is its
/// own choice.
pub trait TokenStore: Send + Sync {
    /// Issues a fresh unique token id and durably advances the source.
    fn next_token_id(&self) -> TokenStoreResult<String>;

    /// Persists a token under its id.
    fn put(&self, token_id: &str, token: ResumptionToken) -> TokenStoreResult<()>;

    /// Retrieves a token, when present.
    fn get(&self, token_id: &str) -> TokenStoreResult<Option<ResumptionToken>>;

    /// Removes a token. Removing an absent token is not an error.
    fn delete(&self, token_id: &str) -> TokenStoreResult<()>;
}

/// Process-local token store.
///
/// Ids come from an atomic counter, so concurrent truncated listings can
/// never collide; a persistent implementation would need an equivalent
/// serialised increment or random ids.
#[derive(Debug)]
pub struct InMemoryTokenStore {
    next_id: AtomicU64,
    tokens: Mutex<HashMap<String, ResumptionToken>>,
}

impl InMemoryTokenStore {
    /// Creates an empty store with ids starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> TokenStoreResult<std::sync::MutexGuard<'_, HashMap<String, ResumptionToken>>> {
        self.tokens
            .lock()
            .map_err(|_| TokenStoreError::internal("token table lock poisoned"))
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn next_token_id(&self) -> TokenStoreResult<String> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }

    fn put(&self, token_id: &str, token: ResumptionToken) -> TokenStoreResult<()> {
        self.lock()?.insert(token_id.to_string(), token);
        Ok(())
    }

    fn get(&self, token_id: &str) -> TokenStoreResult<Option<ResumptionToken>> {
        Ok(self.lock()?.get(token_id).cloned())
    }

    fn delete(&self, token_id: &str) -> TokenStoreResult<()> {
        self.lock()?.remove(token_id);
        Ok(())
    }
}
