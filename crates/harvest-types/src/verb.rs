//! The closed set of OAI-PMH verbs.

use serde::{Deserialize, Serialize};

/// The six OAI-PMH protocol verbs.
///
/// Dispatch is an exhaustive `match` over this enum, so adding a verb is a
/// compile-time checked change rather than a string-table edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    /// Retrieve a single record by identifier.
    GetRecord,
    /// Describe the repository.
    Identify,
    /// List record headers matching a filter.
    ListIdentifiers,
    /// List supported metadata formats.
    ListMetadataFormats,
    /// List full records matching a filter.
    ListRecords,
    /// List the set hierarchy.
    ListSets,
}

impl Verb {
    /// Parses a verb argument.
    ///
    /// Verb strings are case-sensitive per the protocol; anything that is
    /// not exactly one of the six legal values is rejected, and the caller
    /// reports `badVerb`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GetRecord" => Some(Self::GetRecord),
            "Identify" => Some(Self::Identify),
            "ListIdentifiers" => Some(Self::ListIdentifiers),
            "ListMetadataFormats" => Some(Self::ListMetadataFormats),
            "ListRecords" => Some(Self::ListRecords),
            "ListSets" => Some(Self::ListSets),
            _ => None,
        }
    }

    /// Returns the canonical verb string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetRecord => "GetRecord",
            Self::Identify => "Identify",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListMetadataFormats => "ListMetadataFormats",
            Self::ListRecords => "ListRecords",
            Self::ListSets => "ListSets",
        }
    }

    /// Whether this verb participates in resumption-token pagination.
    #[must_use]
    pub fn supports_resumption(&self) -> bool {
        matches!(self, Self::ListIdentifiers | Self::ListRecords)
    }
}
