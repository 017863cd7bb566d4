//! Shared pagination for `ListIdentifiers` and `ListRecords`.
//!
//! Both verbs resolve one result window — either adopted from a
//! resumption token or built fresh from the request arguments — fetch
//! one page, and differ only in what they emit per record. Token
//! creation is the last side effect of a truncated page, so no token is
//! ever persisted for a response that was never assembled.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

use harvest_types::{Record, RecordFilter, ResumptionToken, Verb};

use crate::dispatch::{DISPATCH_TARGET, DispatchError, Query};
use crate::endpoint::{Endpoint, RequestContext};
use crate::response::{
    Element, ErrorCode, Node, OAI_DATESTAMP_FORMAT, ResponseBuilder, format_datestamp,
};

/// Records per listing page.
pub(crate) const PAGE_SIZE: u64 = 10;

const DATE_ONLY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// One resolved result window: the filter, the format, and where in the
/// complete list the page starts.
struct ListingWindow {
    filter: RecordFilter,
    metadata_prefix: String,
    cursor: u64,
    /// Known only when adopted from a token; fresh listings count first.
    complete_list_size: Option<u64>,
}

/// One fetched page plus its resumption element (empty at end of list).
struct Page {
    records: Vec<Record>,
    resumption: Element,
}

impl Endpoint {
    /// Emits one page of record headers.
    pub(crate) fn list_identifiers(
        &self,
        ctx: &RequestContext,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Result<(), DispatchError> {
        let Some(page) = self.paginate(ctx, Verb::ListIdentifiers, query, response)? else {
            return Ok(());
        };
        let headers: Vec<Node> = page
            .records
            .iter()
            .map(|record| Node::Element(self.header_node(ctx, record)))
            .collect();
        response.set_payload(
            Element::new()
                .child("header", Node::Sequence(headers))
                .child("resumptionToken", page.resumption),
        );
        Ok(())
    }

    /// Emits one page of full records.
    pub(crate) fn list_records(
        &self,
        ctx: &RequestContext,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Result<(), DispatchError> {
        let Some(page) = self.paginate(ctx, Verb::ListRecords, query, response)? else {
            return Ok(());
        };
        let records: Vec<Node> = page
            .records
            .iter()
            .map(|record| Node::Element(self.record_node(ctx, record)))
            .collect();
        response.set_payload(
            Element::new()
                .child("record", Node::Sequence(records))
                .child("resumptionToken", page.resumption),
        );
        Ok(())
    }

    /// Resolves the window, fetches its page, and mints the continuation
    /// token when the list is truncated.
    ///
    /// `None` means a protocol error was recorded and the handler must
    /// emit nothing.
    fn paginate(
        &self,
        ctx: &RequestContext,
        verb: Verb,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Result<Option<Page>, DispatchError> {
        let Some(window) = self.resolve_window(ctx, verb, query, response)? else {
            return Ok(None);
        };

        // The count frozen at listing start is reused verbatim on later
        // pages so a harvest sees a stable total even when records are
        // inserted mid-session.
        let complete_list_size = match window.complete_list_size {
            Some(size) => size,
            None => self.repository.count_matching(&window.filter)?,
        };
        let records = self
            .repository
            .query_matching(&window.filter, window.cursor, PAGE_SIZE)?;

        let resumption = if complete_list_size > window.cursor + PAGE_SIZE {
            self.mint_token(ctx, verb, &window, complete_list_size)?
        } else {
            // An empty resumptionToken element closes a completed list.
            Element::new()
        };
        Ok(Some(Page {
            records,
            resumption,
        }))
    }

    fn resolve_window(
        &self,
        ctx: &RequestContext,
        verb: Verb,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Result<Option<ListingWindow>, DispatchError> {
        if let Some(token_id) = query.get("resumptionToken") {
            response.echo_argument("resumptionToken", token_id);
            return self.adopt_token(ctx, verb, token_id, response);
        }
        Ok(self.fresh_window(query, response))
    }

    /// Continues a listing from a persisted token, discarding any filter
    /// arguments supplied directly alongside it.
    ///
    /// Expired tokens are deleted on lookup. A token bound to the other
    /// listing verb is rejected but kept, so the harvester can still
    /// replay it under the right verb.
    fn adopt_token(
        &self,
        ctx: &RequestContext,
        verb: Verb,
        token_id: &str,
        response: &mut ResponseBuilder,
    ) -> Result<Option<ListingWindow>, DispatchError> {
        let Some(token) = self.tokens.get(token_id)? else {
            response.error_canonical(ErrorCode::BadResumptionToken);
            return Ok(None);
        };
        if token.is_expired(ctx.now) {
            debug!(target: DISPATCH_TARGET, token_id, "pruning expired resumption token");
            self.tokens.delete(token_id)?;
            response.error_canonical(ErrorCode::BadResumptionToken);
            return Ok(None);
        }
        if token.verb != verb {
            response.error_canonical(ErrorCode::BadResumptionToken);
            return Ok(None);
        }
        Ok(Some(ListingWindow {
            filter: RecordFilter {
                set: token.set,
                from: token.from,
                until: token.until,
            },
            metadata_prefix: token.metadata_prefix,
            cursor: token.cursor,
            complete_list_size: Some(token.complete_list_size),
        }))
    }

    /// Builds the window for the first page of a new listing, validating
    /// every argument and echoing the ones used.
    fn fresh_window(
        &self,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Option<ListingWindow> {
        let set = query.get("set").map(str::to_string);
        if set.is_some() && !self.config.sets_available() {
            response.error_canonical(ErrorCode::NoSetHierarchy);
        }

        let metadata_prefix = match query.get("metadataPrefix") {
            None => {
                response.error(
                    ErrorCode::BadArgument,
                    "Missing required argument metadataPrefix.",
                );
                None
            }
            Some(prefix) if !self.formats.supports(prefix) => {
                response.error_canonical(ErrorCode::CannotDisseminateFormat);
                None
            }
            Some(prefix) => {
                response.echo_argument("metadataPrefix", prefix);
                Some(prefix.to_string())
            }
        };
        if let Some(value) = &set {
            response.echo_argument("set", value);
        }
        let from = datestamp_bound(query, "from", response);
        let until = datestamp_bound(query, "until", response);

        if response.failed() {
            return None;
        }
        Some(ListingWindow {
            filter: RecordFilter { set, from, until },
            metadata_prefix: metadata_prefix?,
            cursor: 0,
            complete_list_size: None,
        })
    }

    /// Persists the continuation token and builds its response element.
    fn mint_token(
        &self,
        ctx: &RequestContext,
        verb: Verb,
        window: &ListingWindow,
        complete_list_size: u64,
    ) -> Result<Element, DispatchError> {
        let lifetime = i64::try_from(self.config.token_expiration_secs).unwrap_or(i64::MAX);
        let expires = ctx.now + Duration::seconds(lifetime);
        let token = ResumptionToken {
            verb,
            metadata_prefix: window.metadata_prefix.clone(),
            set: window.filter.set.clone(),
            from: window.filter.from,
            until: window.filter.until,
            cursor: window.cursor + PAGE_SIZE,
            complete_list_size,
            expires,
        };

        let token_id = self.tokens.next_token_id()?;
        self.tokens.put(&token_id, token)?;
        debug!(
            target: DISPATCH_TARGET,
            token_id,
            next_cursor = window.cursor + PAGE_SIZE,
            complete_list_size,
            "minted resumption token"
        );
        Ok(Element::new()
            .attr("completeListSize", complete_list_size.to_string())
            .attr("cursor", window.cursor.to_string())
            .attr("expirationDate", format_datestamp(expires))
            .text(token_id))
    }
}

/// Parses an optional datestamp argument, echoing valid values and
/// recording `badArgument` for malformed ones.
fn datestamp_bound(
    query: &Query,
    name: &str,
    response: &mut ResponseBuilder,
) -> Option<OffsetDateTime> {
    let raw = query.get(name)?;
    match parse_datestamp(raw) {
        Some(parsed) => {
            response.echo_argument(name, raw);
            Some(parsed)
        }
        None => {
            response.error(
                ErrorCode::BadArgument,
                format!("Value of the {name} argument is not a valid UTC datestamp."),
            );
            None
        }
    }
}

/// Accepts the two protocol granularities: `YYYY-MM-DD` and
/// `YYYY-MM-DDThh:mm:ssZ`. Date-only values mean midnight UTC.
fn parse_datestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(stamp) = PrimitiveDateTime::parse(raw, OAI_DATESTAMP_FORMAT) {
        return Some(stamp.assume_utc());
    }
    Date::parse(raw, DATE_ONLY_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Duration;
    use time::macros::datetime;

    use harvest_types::{RecordFilter, ResumptionToken, Verb};

    use crate::dispatch::testing::{
        StaticMapper, TEST_NOW, context, endpoint_with, endpoint_with_config, error_codes,
        payload, query, record, test_config,
    };
    use crate::endpoint::Endpoint;
    use crate::repository::MockRecordRepository;
    use crate::response::{Element, Node};
    use crate::token_store::{InMemoryTokenStore, TokenStore};

    use super::parse_datestamp;

    fn endpoint_with_store(
        repository: MockRecordRepository,
        store: Arc<InMemoryTokenStore>,
    ) -> Endpoint {
        Endpoint::new(
            test_config(),
            Arc::new(repository),
            store,
            Arc::new(StaticMapper),
        )
    }

    fn stored_token(cursor: u64, expires_in: Duration) -> ResumptionToken {
        ResumptionToken {
            verb: Verb::ListIdentifiers,
            metadata_prefix: "oai_dc".to_string(),
            set: Some("featured".to_string()),
            from: None,
            until: None,
            cursor,
            complete_list_size: 25,
            expires: TEST_NOW + expires_in,
        }
    }

    fn resumption_element<'a>(root: &'a Element, verb: &str) -> &'a Element {
        let body = payload(root, verb).expect("verb payload");
        let Some(Node::Element(resumption)) = body.find_child("resumptionToken") else {
            panic!("resumptionToken element missing");
        };
        resumption
    }

    #[test]
    fn missing_metadata_prefix_is_a_bad_argument() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(&context(), &query(&[("verb", "ListIdentifiers")]))
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["badArgument"]);
        assert!(root.find_child("ListIdentifiers").is_none());
    }

    #[test]
    fn unsupported_prefix_cannot_be_disseminated() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListRecords"), ("metadataPrefix", "mods")]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["cannotDisseminateFormat"]);
    }

    #[test]
    fn set_filter_without_set_support_has_no_hierarchy() {
        let mut config = test_config();
        config.set_sources.clear();

        let endpoint = endpoint_with_config(MockRecordRepository::new(), config);
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "ListRecords"),
                    ("metadataPrefix", "oai_dc"),
                    ("set", "featured"),
                ]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["noSetHierarchy"]);
    }

    #[test]
    fn malformed_from_is_a_bad_argument() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "ListIdentifiers"),
                    ("metadataPrefix", "oai_dc"),
                    ("from", "last tuesday"),
                ]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["badArgument"]);
    }

    #[test]
    fn accepts_both_datestamp_granularities() {
        assert_eq!(
            parse_datestamp("2024-03-01"),
            Some(datetime!(2024-03-01 00:00:00 UTC))
        );
        assert_eq!(
            parse_datestamp("2024-03-01T08:30:00Z"),
            Some(datetime!(2024-03-01 08:30:00 UTC))
        );
        assert_eq!(parse_datestamp("2024-03-01 08:30"), None);
        assert_eq!(parse_datestamp(""), None);
    }

    #[test]
    fn truncated_listing_mints_a_token_with_progress_attributes() {
        let mut repository = MockRecordRepository::new();
        repository.expect_count_matching().returning(|_| Ok(25));
        repository
            .expect_query_matching()
            .withf(|filter, offset, limit| {
                filter == &RecordFilter::default() && *offset == 0 && *limit == 10
            })
            .returning(|_, _, _| Ok((0..10).map(record).collect()));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());

        let store = Arc::new(InMemoryTokenStore::new());
        let endpoint = endpoint_with_store(repository, Arc::clone(&store));
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
            )
            .expect("dispatch should succeed");

        let body = payload(&root, "ListIdentifiers").expect("payload");
        let Some(Node::Sequence(headers)) = body.find_child("header") else {
            panic!("header sequence missing");
        };
        assert_eq!(headers.len(), 10);

        let resumption = resumption_element(&root, "ListIdentifiers");
        assert_eq!(resumption.find_attribute("completeListSize"), Some("25"));
        assert_eq!(resumption.find_attribute("cursor"), Some("0"));
        assert_eq!(
            resumption.find_attribute("expirationDate"),
            Some("2024-06-01T13:00:00Z")
        );
        assert_eq!(resumption.text_value(), Some("1"));

        let stored = store.get("1").expect("store lookup").expect("token stored");
        assert_eq!(stored.cursor, 10);
        assert_eq!(stored.complete_list_size, 25);
        assert_eq!(stored.verb, Verb::ListIdentifiers);
    }

    #[test]
    fn completed_listing_closes_with_an_empty_token_element() {
        let mut repository = MockRecordRepository::new();
        repository.expect_count_matching().returning(|_| Ok(5));
        repository
            .expect_query_matching()
            .returning(|_, _, _| Ok((0..5).map(record).collect()));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());

        let endpoint = endpoint_with(repository);
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListIdentifiers"), ("metadataPrefix", "oai_dc")]),
            )
            .expect("dispatch should succeed");

        assert!(resumption_element(&root, "ListIdentifiers").is_empty());
    }

    #[test]
    fn successful_listing_echoes_its_filter_arguments() {
        let mut repository = MockRecordRepository::new();
        repository.expect_count_matching().returning(|_| Ok(0));
        repository
            .expect_query_matching()
            .returning(|_, _, _| Ok(Vec::new()));

        let endpoint = endpoint_with(repository);
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "ListIdentifiers"),
                    ("metadataPrefix", "oai_dc"),
                    ("from", "2024-01-01"),
                    ("until", "2024-02-01T00:00:00Z"),
                ]),
            )
            .expect("dispatch should succeed");

        let Some(Node::Element(request)) = root.find_child("request") else {
            panic!("request echo missing");
        };
        assert_eq!(request.find_attribute("verb"), Some("ListIdentifiers"));
        assert_eq!(request.find_attribute("metadataPrefix"), Some("oai_dc"));
        assert_eq!(request.find_attribute("from"), Some("2024-01-01"));
        assert_eq!(
            request.find_attribute("until"),
            Some("2024-02-01T00:00:00Z")
        );
    }

    #[test]
    fn unknown_token_is_rejected() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListIdentifiers"), ("resumptionToken", "42")]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["badResumptionToken"]);
    }

    #[test]
    fn expired_token_is_rejected_and_pruned() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .put("9", stored_token(10, Duration::seconds(-1)))
            .expect("seed token");

        let endpoint = endpoint_with_store(MockRecordRepository::new(), Arc::clone(&store));
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListIdentifiers"), ("resumptionToken", "9")]),
            )
            .expect("dispatch should succeed");

        assert_eq!(error_codes(&root), ["badResumptionToken"]);
        assert_eq!(store.get("9").expect("store lookup"), None);
    }

    #[test]
    fn verb_mismatched_token_is_rejected_but_kept() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .put("9", stored_token(10, Duration::hours(1)))
            .expect("seed token");

        let endpoint = endpoint_with_store(MockRecordRepository::new(), Arc::clone(&store));
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListRecords"), ("resumptionToken", "9")]),
            )
            .expect("dispatch should succeed");

        assert_eq!(error_codes(&root), ["badResumptionToken"]);
        assert!(store.get("9").expect("store lookup").is_some());
    }

    #[test]
    fn token_adoption_discards_directly_supplied_arguments() {
        let mut repository = MockRecordRepository::new();
        repository
            .expect_query_matching()
            .withf(|filter, offset, limit| {
                filter.set.as_deref() == Some("featured") && *offset == 10 && *limit == 10
            })
            .returning(|_, _, _| Ok((10..20).map(record).collect()));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());

        let store = Arc::new(InMemoryTokenStore::new());
        store
            .put("9", stored_token(10, Duration::hours(1)))
            .expect("seed token");

        let endpoint = endpoint_with_store(repository, Arc::clone(&store));
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "ListIdentifiers"),
                    ("resumptionToken", "9"),
                    // Conflicting direct arguments, ignored in favour of
                    // the token's stored window.
                    ("metadataPrefix", "mods"),
                    ("set", "theses"),
                ]),
            )
            .expect("dispatch should succeed");

        assert_eq!(error_codes(&root), Vec::<String>::new());
        let resumption = resumption_element(&root, "ListIdentifiers");
        assert_eq!(resumption.find_attribute("completeListSize"), Some("25"));
        assert_eq!(resumption.find_attribute("cursor"), Some("10"));

        let minted = store.get("1").expect("store lookup").expect("next token");
        assert_eq!(minted.cursor, 20);
        assert_eq!(minted.metadata_prefix, "oai_dc");
        assert_eq!(minted.set.as_deref(), Some("featured"));
    }

    #[test]
    fn cached_list_size_is_reused_without_recounting() {
        let mut repository = MockRecordRepository::new();
        // No count_matching expectation: a recount would panic the mock.
        repository
            .expect_query_matching()
            .returning(|_, _, _| Ok((20..25).map(record).collect()));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());

        let store = Arc::new(InMemoryTokenStore::new());
        store
            .put("9", stored_token(20, Duration::hours(1)))
            .expect("seed token");

        let endpoint = endpoint_with_store(repository, store);
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListIdentifiers"), ("resumptionToken", "9")]),
            )
            .expect("dispatch should succeed");

        // Final page: 20 + 10 >= 25, so the list closes.
        assert!(resumption_element(&root, "ListIdentifiers").is_empty());
    }

    #[test]
    fn list_records_pages_carry_full_records() {
        let mut repository = MockRecordRepository::new();
        repository.expect_count_matching().returning(|_| Ok(2));
        repository
            .expect_query_matching()
            .returning(|_, _, _| Ok((1..=2).map(record).collect()));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());

        let endpoint = endpoint_with(repository);
        let root = endpoint
            .handle(
                &context(),
                &query(&[("verb", "ListRecords"), ("metadataPrefix", "oai_dc")]),
            )
            .expect("dispatch should succeed");

        let body = payload(&root, "ListRecords").expect("payload");
        let Some(Node::Sequence(records)) = body.find_child("record") else {
            panic!("record sequence missing");
        };
        assert_eq!(records.len(), 2);
        let Node::Element(first) = &records[0] else {
            panic!("record entry is not an element");
        };
        assert!(first.find_child("header").is_some());
        assert!(first.find_child("metadata").is_some());
    }
}
