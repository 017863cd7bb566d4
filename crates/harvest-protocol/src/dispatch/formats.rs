//! The `ListMetadataFormats` verb.

use crate::endpoint::Endpoint;
use crate::response::{Element, Node, ResponseBuilder};

impl Endpoint {
    /// Lists the formats the endpoint can disseminate. Always succeeds.
    pub(crate) fn list_metadata_formats(&self, response: &mut ResponseBuilder) {
        let formats: Vec<Node> = self
            .formats
            .iter()
            .map(|format| {
                Node::Element(
                    Element::new()
                        .text_child("metadataPrefix", format.prefix)
                        .text_child("schema", format.schema)
                        .text_child("metadataNamespace", format.namespace),
                )
            })
            .collect();

        response.set_payload(Element::new().child("metadataFormat", Node::Sequence(formats)));
    }
}
