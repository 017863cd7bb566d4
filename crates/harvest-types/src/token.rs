//! Resumption-token state persisted between pages of a harvest.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Verb;

/// One in-flight paginated listing.
///
/// The token captures everything a replay needs to reproduce the next
/// result window: the original filter arguments, the cursor, and the total
/// match count frozen when the listing began. `complete_list_size` is
/// reused verbatim on every page so a harvest sees a stable total even
/// when records are inserted mid-session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumptionToken {
    /// The listing verb this token continues. Replays with a different
    /// verb are rejected.
    pub verb: Verb,
    /// Metadata format of the original request.
    pub metadata_prefix: String,
    /// Set filter of the original request.
    pub set: Option<String>,
    /// Lower datestamp bound of the original request.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    /// Upper datestamp bound of the original request.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub until: Option<OffsetDateTime>,
    /// Offset of the next page.
    pub cursor: u64,
    /// Total match count cached at listing start.
    pub complete_list_size: u64,
    /// Instant after which the token is no longer honoured.
    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,
}

impl ResumptionToken {
    /// A token is valid only strictly before its expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires
    }
}
