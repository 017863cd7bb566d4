//! The `GetRecord` verb: one record by identifier.

use harvest_types::Record;

use crate::dispatch::{DispatchError, Query};
use crate::endpoint::{Endpoint, RequestContext};
use crate::identifier;
use crate::response::{Element, ErrorCode, ResponseBuilder};

impl Endpoint {
    /// Emits one record (header plus metadata).
    ///
    /// Validation accumulates: a request missing both arguments reports
    /// `badArgument` for the identifier, `idDoesNotExist`, and
    /// `badArgument` for the prefix in that order, and an unsupported
    /// prefix reports `cannotDisseminateFormat` even when the identifier
    /// resolves.
    pub(crate) fn get_record(
        &self,
        ctx: &RequestContext,
        query: &Query,
        response: &mut ResponseBuilder,
    ) -> Result<(), DispatchError> {
        let identifier_arg = query.get("identifier");
        if identifier_arg.is_none() {
            response.error(ErrorCode::BadArgument, "Missing required argument identifier.");
        }

        let record = match identifier_arg {
            Some(raw) => self.resolve_visible_record(ctx, raw)?,
            None => None,
        };
        if record.is_none() {
            response.error_canonical(ErrorCode::IdDoesNotExist);
        }

        match query.get("metadataPrefix") {
            None => {
                response.error(
                    ErrorCode::BadArgument,
                    "Missing required argument metadataPrefix.",
                );
            }
            Some(prefix) if !self.formats.supports(prefix) => {
                response.error_canonical(ErrorCode::CannotDisseminateFormat);
            }
            Some(_) => {}
        }

        if response.failed() {
            return Ok(());
        }
        let Some(record) = record else {
            return Ok(());
        };

        let node = self.record_node(ctx, &record);
        response.set_payload(Element::new().child("record", node));
        Ok(())
    }

    /// Decodes an identifier and loads its record, treating decode
    /// failures, unknown records, and view-denied records alike as
    /// absent.
    fn resolve_visible_record(
        &self,
        ctx: &RequestContext,
        raw: &str,
    ) -> Result<Option<Record>, DispatchError> {
        let Ok((entity_type, entity_id)) = identifier::decode(raw, &ctx.host) else {
            return Ok(None);
        };
        let Some(record) = self.repository.load_for_identifier(&entity_type, &entity_id)? else {
            return Ok(None);
        };
        if !self.repository.can_view(&ctx.caller, &record)? {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::testing::{
        context, endpoint_with, error_codes, payload, query, record,
    };
    use crate::repository::MockRecordRepository;
    use crate::response::Node;

    fn repository_with_record(n: u64) -> MockRecordRepository {
        let mut repository = MockRecordRepository::new();
        repository
            .expect_load_for_identifier()
            .withf(move |entity_type, entity_id| entity_type == "node" && entity_id == n.to_string())
            .returning(move |_, _| Ok(Some(record(n))));
        repository.expect_can_view().returning(|_, _| Ok(true));
        repository
            .expect_set_membership()
            .returning(|record| record.sets.clone());
        repository
    }

    #[test]
    fn emits_header_and_metadata_for_a_visible_record() {
        let endpoint = endpoint_with(repository_with_record(7));
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "GetRecord"),
                    ("identifier", "oai:example.org:node-7"),
                    ("metadataPrefix", "oai_dc"),
                ]),
            )
            .expect("dispatch should succeed");

        let body = payload(&root, "GetRecord").expect("GetRecord payload");
        let Some(Node::Element(record_node)) = body.find_child("record") else {
            panic!("record element missing");
        };
        let Some(Node::Element(header)) = record_node.find_child("header") else {
            panic!("header missing");
        };
        assert_eq!(
            header.find_child("identifier"),
            Some(&Node::Text("oai:example.org:node-7".to_string()))
        );
        assert!(matches!(
            header.find_child("setSpec"),
            Some(Node::Sequence(specs)) if specs == &[Node::Text("featured".to_string())]
        ));

        let Some(Node::Element(metadata)) = record_node.find_child("metadata") else {
            panic!("metadata missing");
        };
        let Some(Node::Element(dc)) = metadata.find_child("oai_dc:dc") else {
            panic!("oai_dc:dc missing");
        };
        assert_eq!(
            dc.find_child("dc:title"),
            Some(&Node::Text("Record 7".to_string()))
        );
    }

    #[test]
    fn missing_arguments_accumulate_in_the_original_order() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(&context(), &query(&[("verb", "GetRecord")]))
            .expect("dispatch should succeed");

        assert_eq!(
            error_codes(&root),
            ["badArgument", "idDoesNotExist", "badArgument"]
        );
        assert!(root.find_child("GetRecord").is_none());
    }

    #[test]
    fn unsupported_prefix_fails_even_with_a_valid_identifier() {
        let endpoint = endpoint_with(repository_with_record(7));
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "GetRecord"),
                    ("identifier", "oai:example.org:node-7"),
                    ("metadataPrefix", "mods"),
                ]),
            )
            .expect("dispatch should succeed");

        assert_eq!(error_codes(&root), ["cannotDisseminateFormat"]);
        assert!(root.find_child("GetRecord").is_none());
    }

    #[test]
    fn wrong_host_identifier_is_unknown() {
        let endpoint = endpoint_with(MockRecordRepository::new());
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "GetRecord"),
                    ("identifier", "oai:other.org:node-7"),
                    ("metadataPrefix", "oai_dc"),
                ]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["idDoesNotExist"]);
    }

    #[test]
    fn view_denied_record_is_indistinguishable_from_an_absent_one() {
        let mut repository = MockRecordRepository::new();
        repository
            .expect_load_for_identifier()
            .returning(|_, _| Ok(Some(record(7))));
        repository.expect_can_view().returning(|_, _| Ok(false));

        let endpoint = endpoint_with(repository);
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "GetRecord"),
                    ("identifier", "oai:example.org:node-7"),
                    ("metadataPrefix", "oai_dc"),
                ]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["idDoesNotExist"]);
    }

    #[test]
    fn unknown_record_is_reported_once() {
        let mut repository = MockRecordRepository::new();
        repository
            .expect_load_for_identifier()
            .returning(|_, _| Ok(None));

        let endpoint = endpoint_with(repository);
        let root = endpoint
            .handle(
                &context(),
                &query(&[
                    ("verb", "GetRecord"),
                    ("identifier", "oai:example.org:node-404"),
                    ("metadataPrefix", "oai_dc"),
                ]),
            )
            .expect("dispatch should succeed");
        assert_eq!(error_codes(&root), ["idDoesNotExist"]);
    }
}
