//! The `Identify` verb: static repository self-description.

use crate::dispatch::DispatchError;
use crate::endpoint::{Endpoint, RequestContext};
use crate::identifier;
use crate::response::{Element, ResponseBuilder, format_datestamp};

const OAI_IDENTIFIER_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/oai-identifier";
const OAI_IDENTIFIER_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/oai-identifier \
     http://www.openarchives.org/OAI/2.0/oai-identifier.xsd";

impl Endpoint {
    /// Describes the repository. Takes no arguments and always succeeds
    /// once configuration is present.
    pub(crate) fn identify(
        &self,
        ctx: &RequestContext,
        response: &mut ResponseBuilder,
    ) -> Result<(), DispatchError> {
        let earliest = self.repository.earliest_created()?;

        let description = Element::new()
            .attr("xmlns", OAI_IDENTIFIER_NAMESPACE)
            .attr("xsi:schemaLocation", OAI_IDENTIFIER_SCHEMA_LOCATION)
            .text_child("scheme", identifier::SCHEME)
            .text_child("repositoryIdentifier", &ctx.host)
            .text_child("delimiter", ":")
            .text_child("sampleIdentifier", identifier::encode("record", "1", &ctx.host));

        let payload = Element::new()
            .text_child("repositoryName", &self.config.repository_name)
            .text_child("baseURL", self.base_url(ctx))
            .text_child("protocolVersion", "2.0")
            .text_child("adminEmail", &self.config.admin_email)
            .text_child("earliestDatestamp", format_datestamp(earliest))
            .text_child("deletedRecord", "no")
            .text_child("granularity", "YYYY-MM-DDThh:mm:ssZ")
            .child(
                "description",
                Element::new().child("oai-identifier", description),
            );

        response.set_payload(payload);
        Ok(())
    }
}
