//! Records, sets, and the query filter shared with the repository port.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One exposable content item.
///
/// The composite `(entity_type, entity_id)` pair is the natural key. The
/// repository owns record lifecycle; the protocol engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Storage type of the underlying entity.
    pub entity_type: String,
    /// Identifier of the entity within its type.
    pub entity_id: String,
    /// Last-modification time, used for `from`/`until` filtering and the
    /// header datestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub changed: OffsetDateTime,
    /// Sets this record currently belongs to, in membership order.
    pub sets: Vec<String>,
}

/// One harvestable collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    /// Unique set identifier, exposed as `setSpec`.
    pub set_id: String,
    /// Display name, exposed as `setName`.
    pub label: String,
}

/// Selection criteria for listing verbs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Restrict matches to members of this set.
    pub set: Option<String>,
    /// Lower inclusive bound on `Record::changed`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    /// Upper inclusive bound on `Record::changed`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub until: Option<OffsetDateTime>,
}

/// Opaque handle for the caller on whose behalf a request runs.
///
/// The repository's `can_view` capability is the only authorisation
/// decision the protocol engine consults per record; coarse endpoint
/// access is settled by the transport before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(pub String);

impl CallerId {
    /// Creates a caller handle from any string-like id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the caller id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
