//! Metadata formats and the injected Dublin Core mapping seam.
//!
//! The core never renders descriptive metadata itself. An external
//! collaborator supplies a [`MetadataMapper`] that turns a record into
//! `(element, value)` pairs; the assembler wraps them in the
//! namespace-decorated `oai_dc:dc` container.

use harvest_types::Record;

use crate::response::{Element, XSI_NAMESPACE};

/// Dublin Core elements namespace.
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// One supported metadata format as advertised by `ListMetadataFormats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFormat {
    /// The `metadataPrefix` argument value selecting this format.
    pub prefix: &'static str,
    /// Schema URL.
    pub schema: &'static str,
    /// Metadata namespace URL.
    pub namespace: &'static str,
}

/// The unqualified Dublin Core format every endpoint supports.
pub const OAI_DC: MetadataFormat = MetadataFormat {
    prefix: "oai_dc",
    schema: "http://www.openarchives.org/OAI/2.0/oai_dc.xsd",
    namespace: "http://www.openarchives.org/OAI/2.0/oai_dc/",
};

/// Registry of metadata formats the endpoint can disseminate.
///
/// Ships with the single `oai_dc` entry; additional formats can be
/// registered without touching the dispatch code.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: Vec<MetadataFormat>,
}

impl FormatRegistry {
    /// Registry holding only the mandatory `oai_dc` format.
    #[must_use]
    pub fn oai_dc_only() -> Self {
        Self {
            formats: vec![OAI_DC],
        }
    }

    /// Registers an additional format.
    pub fn register(&mut self, format: MetadataFormat) {
        self.formats.push(format);
    }

    /// Whether the given `metadataPrefix` is disseminable.
    #[must_use]
    pub fn supports(&self, prefix: &str) -> bool {
        self.formats.iter().any(|format| format.prefix == prefix)
    }

    /// Formats in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataFormat> {
        self.formats.iter()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::oai_dc_only()
    }
}

/// Pure record-to-terms mapping supplied by the metadata collaborator.
///
/// Terms are unqualified Dublin Core element names (`title`, `creator`);
/// the assembler qualifies them as `dc:NAME`. A term may repeat.
pub trait MetadataMapper: Send + Sync {
    /// Maps a record to its descriptive terms.
    fn map(&self, record: &Record) -> Vec<(String, String)>;
}

/// Builds the `oai_dc:dc` container element for a record's terms.
pub(crate) fn dublin_core_element(terms: &[(String, String)]) -> Element {
    let mut container = Element::new()
        .attr("xmlns:oai_dc", OAI_DC.namespace)
        .attr("xmlns:dc", DC_NAMESPACE)
        .attr("xmlns:xsi", XSI_NAMESPACE)
        .attr(
            "xsi:schemaLocation",
            format!("{} {}", OAI_DC.namespace, OAI_DC.schema),
        );
    for (term, value) in terms {
        container = container.text_child(format!("dc:{term}"), value.clone());
    }
    container
}
