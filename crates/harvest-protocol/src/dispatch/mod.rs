//! Verb dispatch for the OAI-PMH conversation.
//!
//! Each of the six verbs is a terminal single-shot handler: the protocol
//! itself is stateless across requests, and continuation state for the
//! listing verbs lives only in the token store. The handlers share the
//! record/header assembly helpers in this module and thread one
//! [`ResponseBuilder`](crate::response::ResponseBuilder) through every
//! stage, so an accumulated error suppresses all later payload writes.

mod errors;
mod formats;
mod get_record;
mod identify;
mod listing;
pub mod query;
mod sets;

pub use errors::DispatchError;
pub use query::Query;

use harvest_types::Record;

use crate::endpoint::{Endpoint, RequestContext};
use crate::identifier;
use crate::metadata::dublin_core_element;
use crate::response::{Element, Node, format_datestamp};

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

impl Endpoint {
    /// Builds the header block shared by GetRecord and the listing verbs.
    ///
    /// `setSpec` fields appear only when the endpoint supports sets.
    pub(crate) fn header_node(&self, ctx: &RequestContext, record: &Record) -> Element {
        let mut header = Element::new()
            .text_child(
                "identifier",
                identifier::encode(&record.entity_type, &record.entity_id, &ctx.host),
            )
            .text_child("datestamp", format_datestamp(record.changed));

        if self.config.support_sets {
            let memberships = self.repository.set_membership(record);
            if !memberships.is_empty() {
                header = header.child(
                    "setSpec",
                    Node::Sequence(memberships.into_iter().map(Node::Text).collect()),
                );
            }
        }
        header
    }

    /// Builds a full record block: header plus mapped metadata.
    pub(crate) fn record_node(&self, ctx: &RequestContext, record: &Record) -> Element {
        let terms = self.mapper.map(record);
        let metadata = Element::new().child("oai_dc:dc", dublin_core_element(&terms));
        Element::new()
            .child("header", self.header_node(ctx, record))
            .child("metadata", metadata)
    }
}

#[cfg(test)]
pub(crate) mod testing;
