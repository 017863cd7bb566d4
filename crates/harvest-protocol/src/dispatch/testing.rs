//! Shared fixtures for dispatch unit tests.

use std::sync::Arc;

use time::OffsetDateTime;
use time::macros::datetime;

use harvest_config::RepositoryConfig;
use harvest_types::{CallerId, Record};

use crate::endpoint::{Endpoint, RequestContext};
use crate::metadata::MetadataMapper;
use crate::repository::MockRecordRepository;
use crate::response::{Element, Node};
use crate::token_store::InMemoryTokenStore;

use super::Query;

/// Fixed request instant used across dispatch tests.
pub(crate) const TEST_NOW: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

/// Mapper producing a deterministic title per record.
pub(crate) struct StaticMapper;

impl MetadataMapper for StaticMapper {
    fn map(&self, record: &Record) -> Vec<(String, String)> {
        vec![(
            "title".to_string(),
            format!("Record {}", record.entity_id),
        )]
    }
}

/// Configuration with set support and one configured source.
pub(crate) fn test_config() -> RepositoryConfig {
    RepositoryConfig {
        repository_name: "Example Repository".to_string(),
        admin_email: "admin@example.org".to_string(),
        set_sources: vec!["featured:block_1".to_string()],
        ..RepositoryConfig::default()
    }
}

/// Request context pinned to [`TEST_NOW`].
pub(crate) fn context() -> RequestContext {
    RequestContext::new(
        "https://example.org",
        "example.org",
        CallerId::new("harvester"),
    )
    .at(TEST_NOW)
}

/// Query built from string pairs.
pub(crate) fn query(pairs: &[(&str, &str)]) -> Query {
    Query::from_pairs(pairs.iter().copied())
}

/// A record whose id, datestamp, and set follow from `n`.
pub(crate) fn record(n: u64) -> Record {
    Record {
        entity_type: "node".to_string(),
        entity_id: n.to_string(),
        changed: datetime!(2024-01-01 00:00:00 UTC) + time::Duration::days(
            i64::try_from(n).unwrap_or_default(),
        ),
        sets: vec!["featured".to_string()],
    }
}

/// Endpoint over the given mock with the standard test configuration.
pub(crate) fn endpoint_with(repository: MockRecordRepository) -> Endpoint {
    endpoint_with_config(repository, test_config())
}

/// Endpoint over the given mock and configuration, backed by a fresh
/// in-memory token store and the static mapper.
pub(crate) fn endpoint_with_config(
    repository: MockRecordRepository,
    config: RepositoryConfig,
) -> Endpoint {
    Endpoint::new(
        config,
        Arc::new(repository),
        Arc::new(InMemoryTokenStore::new()),
        Arc::new(StaticMapper),
    )
}

/// Error codes of the finished envelope, in order.
pub(crate) fn error_codes(root: &Element) -> Vec<String> {
    match root.find_child("error") {
        Some(Node::Sequence(errors)) => errors
            .iter()
            .filter_map(|node| match node {
                Node::Element(element) => element
                    .find_attribute("code")
                    .map(std::string::ToString::to_string),
                _ => None,
            })
            .collect(),
        Some(Node::Element(element)) => element
            .find_attribute("code")
            .map(std::string::ToString::to_string)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// The verb payload element of a finished envelope.
pub(crate) fn payload<'a>(root: &'a Element, verb: &str) -> Option<&'a Element> {
    match root.find_child(verb) {
        Some(Node::Element(element)) => Some(element),
        _ => None,
    }
}
