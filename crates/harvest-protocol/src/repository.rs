//! The record-repository port the protocol engine queries.
//!
//! The repository is an external collaborator: it owns record and set
//! materialisation and is typically backed by a database or index over
//! network I/O. Its faults are infrastructure faults, kept strictly
//! apart from the protocol error taxonomy so a harvester's misuse and a
//! backend outage never look alike.

use harvest_types::{CallerId, Record, RecordFilter, Set};
use thiserror::Error;
use time::OffsetDateTime;

/// Infrastructure faults surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached or answered with a fault.
    #[error("record repository unavailable: {message}")]
    Unavailable { message: String },

    /// The query did not complete within the implementation's deadline.
    /// Callers may retry.
    #[error("record repository timed out: {message}")]
    Timeout { message: String },
}

impl RepositoryError {
    /// Creates an unavailability error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Query capability the protocol engine requires from record storage.
///
/// Implementations must apply [`RecordFilter`] consistently between
/// `count_matching` and `query_matching`, and must answer
/// `query_matching` in a stable order so replayed cursors reproduce the
/// same windows.
#[cfg_attr(test, mockall::automock)]
pub trait RecordRepository: Send + Sync {
    /// Minimum creation time across all records, for `Identify`.
    fn earliest_created(&self) -> RepositoryResult<OffsetDateTime>;

    /// All sets in implementation-defined but stable order.
    fn list_sets(&self) -> RepositoryResult<Vec<Set>>;

    /// Total records matching the filter.
    fn count_matching(&self, filter: &RecordFilter) -> RepositoryResult<u64>;

    /// One page of matching records.
    fn query_matching(
        &self,
        filter: &RecordFilter,
        offset: u64,
        limit: u64,
    ) -> RepositoryResult<Vec<Record>>;

    /// Resolves a decoded identifier to its record, when exposed.
    fn load_for_identifier(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Option<Record>>;

    /// Whether the caller may view the record. A negative answer makes
    /// the record indistinguishable from an absent one.
    fn can_view(&self, caller: &CallerId, record: &Record) -> RepositoryResult<bool>;

    /// Set memberships feeding the header's `setSpec` fields.
    fn set_membership(&self, record: &Record) -> Vec<String>;
}
