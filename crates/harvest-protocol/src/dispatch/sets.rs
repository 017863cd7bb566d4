//! The `ListSets` verb.

use crate::dispatch::DispatchError;
use crate::endpoint::Endpoint;
use crate::response::{Element, ErrorCode, Node, ResponseBuilder};

impl Endpoint {
    /// Enumerates the set hierarchy in storage order.
    ///
    /// Never paginated: set counts are bounded by administrative
    /// configuration, so the full list is returned in one response. That
    /// is a scalability limit for repositories with very large set
    /// counts, accepted deliberately.
    pub(crate) fn list_sets(&self, response: &mut ResponseBuilder) -> Result<(), DispatchError> {
        if !self.config.sets_available() {
            response.error_canonical(ErrorCode::NoSetHierarchy);
            return Ok(());
        }

        let sets: Vec<Node> = self
            .repository
            .list_sets()?
            .into_iter()
            .map(|set| {
                Node::Element(
                    Element::new()
                        .text_child("setSpec", set.set_id)
                        .text_child("setName", set.label),
                )
            })
            .collect();

        response.set_payload(Element::new().child("set", Node::Sequence(sets)));
        Ok(())
    }
}
