//! Response-tree assembly and the protocol error accumulator.
//!
//! Verb handlers build a language-neutral tree of [`Element`] values that
//! an external serializer walks to produce the wire format. Attributes
//! serialize under `@`-prefixed keys and element text under `#text`, so
//! a generic XML writer can reconstruct the document without knowing the
//! protocol.
//!
//! The [`ResponseBuilder`] is an explicit value threaded through every
//! handler: it carries the request echo, at most one verb payload, and
//! the accumulated protocol errors. Once any error is recorded the
//! conversation has failed and later payload writes are discarded, which
//! is how handlers are kept from emitting partial results.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use harvest_types::Verb;

/// OAI-PMH envelope namespace.
pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
/// XML Schema instance namespace.
pub(crate) const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";

/// Wire format for every datestamp the protocol emits.
pub(crate) const OAI_DATESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Formats a timestamp as a UTC `YYYY-MM-DDThh:mm:ssZ` datestamp.
#[must_use]
pub fn format_datestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(OAI_DATESTAMP_FORMAT)
        .expect("const datestamp format holds every required component")
}

/// One node of the response tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Character data.
    Text(String),
    /// An ordered run of sibling nodes sharing the parent's child name.
    Sequence(Vec<Node>),
    /// A nested element.
    Element(Element),
}

impl Node {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(value) => serializer.serialize_str(value),
            Self::Sequence(items) => items.serialize(serializer),
            Self::Element(element) => element.serialize(serializer),
        }
    }
}

/// One element of the response tree.
///
/// Children are an ordered sequence of `(name, node)` pairs, not a map:
/// repeated names are legal and preserved in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    attributes: Vec<(String, String)>,
    children: Vec<(String, Node)>,
    text: Option<String>,
}

impl Element {
    /// Creates an empty element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.children.push((name.into(), node.into()));
        self
    }

    /// Appends a child element holding only text.
    #[must_use]
    pub fn text_child(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.child(name, Node::Text(value.into()))
    }

    /// Sets the element's own character data.
    #[must_use]
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    /// Attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[(String, Node)] {
        &self.children
    }

    /// The element's own character data, when present.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// First child with the given name.
    #[must_use]
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    /// Value of the named attribute.
    #[must_use]
    pub fn find_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the element carries no attributes, children, or text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_none()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.attributes.len() + self.children.len() + usize::from(self.text.is_some());
        let mut map = serializer.serialize_map(Some(entries))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(&format!("@{name}"), value)?;
        }
        if let Some(text) = &self.text {
            map.serialize_entry("#text", text)?;
        }
        for (name, node) in &self.children {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

/// The closed protocol error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Verb missing, repeated, or not a legal OAI-PMH verb.
    BadVerb,
    /// Required argument missing or illegal.
    BadArgument,
    /// Resumption token unknown, expired, or bound to a different verb.
    BadResumptionToken,
    /// Identifier unknown or illegal in this repository.
    IdDoesNotExist,
    /// Requested metadata format unsupported.
    CannotDisseminateFormat,
    /// The repository exposes no set hierarchy.
    NoSetHierarchy,
}

impl ErrorCode {
    /// Protocol code string as it appears in the `error` element.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadVerb => "badVerb",
            Self::BadArgument => "badArgument",
            Self::BadResumptionToken => "badResumptionToken",
            Self::IdDoesNotExist => "idDoesNotExist",
            Self::CannotDisseminateFormat => "cannotDisseminateFormat",
            Self::NoSetHierarchy => "noSetHierarchy",
        }
    }

    /// Canonical human-readable message for the code.
    ///
    /// Handlers may substitute a more specific message (notably for
    /// `badArgument`, which names the offending argument).
    #[must_use]
    pub fn canonical_message(&self) -> &'static str {
        match self {
            Self::BadVerb => {
                "Value of the verb argument is not a legal OAI-PMH verb, the verb argument is \
                 missing, or the verb argument is repeated."
            }
            Self::BadArgument => {
                "The request includes illegal arguments or is missing required arguments."
            }
            Self::BadResumptionToken => {
                "The value of the resumptionToken argument is invalid or expired."
            }
            Self::IdDoesNotExist => {
                "The value of the identifier argument is unknown or illegal in this repository."
            }
            Self::CannotDisseminateFormat => {
                "The metadata format identified by the value given for the metadataPrefix \
                 argument is not supported by the item or by the repository."
            }
            Self::NoSetHierarchy => "The repository does not support sets.",
        }
    }
}

/// Accumulates one protocol conversation's envelope, echo, payload, and
/// errors, then assembles the OAI-PMH root element.
#[derive(Debug)]
pub struct ResponseBuilder {
    response_date: OffsetDateTime,
    base_url: String,
    verb: Option<Verb>,
    echoed: Vec<(String, String)>,
    errors: Vec<(ErrorCode, String)>,
    payload: Option<Node>,
}

impl ResponseBuilder {
    /// Starts a response for one request.
    #[must_use]
    pub fn new(response_date: OffsetDateTime, base_url: impl Into<String>) -> Self {
        Self {
            response_date,
            base_url: base_url.into(),
            verb: None,
            echoed: Vec::new(),
            errors: Vec::new(),
            payload: None,
        }
    }

    /// Records the resolved verb for the request echo and payload key.
    pub fn echo_verb(&mut self, verb: Verb) {
        self.verb = Some(verb);
    }

    /// Records a filter argument for the request echo.
    pub fn echo_argument(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.echoed.push((name.into(), value.into()));
    }

    /// Appends a protocol error and marks the conversation failed.
    ///
    /// Insertion order is preserved; the protocol permits several errors
    /// in one response.
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.errors.push((code, message.into()));
    }

    /// Appends a protocol error with its canonical message.
    pub fn error_canonical(&mut self, code: ErrorCode) {
        self.error(code, code.canonical_message());
    }

    /// Whether any protocol error has been recorded.
    #[must_use]
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Installs the verb payload. Discarded once the conversation failed,
    /// so handlers can never leak partial results past an error.
    pub fn set_payload(&mut self, payload: impl Into<Node>) {
        if !self.failed() {
            self.payload = Some(payload.into());
        }
    }

    /// Assembles the OAI-PMH root element.
    ///
    /// The request echo carries the verb and filter attributes only on
    /// success; on failure the echo is reduced to the base URL and the
    /// payload is replaced by the error sequence.
    #[must_use]
    pub fn finish(self) -> Element {
        let mut request = Element::new().text(self.base_url);
        if self.errors.is_empty() {
            if let Some(verb) = self.verb {
                request = request.attr("verb", verb.as_str());
            }
            for (name, value) in self.echoed {
                request = request.attr(name, value);
            }
        }

        let mut root = Element::new()
            .attr("xmlns", OAI_NAMESPACE)
            .attr("xmlns:xsi", XSI_NAMESPACE)
            .attr("xsi:schemaLocation", OAI_SCHEMA_LOCATION)
            .text_child("responseDate", format_datestamp(self.response_date))
            .child("request", request);

        if self.errors.is_empty() {
            if let (Some(verb), Some(payload)) = (self.verb, self.payload) {
                root = root.child(verb.as_str(), payload);
            }
        } else {
            let errors: Vec<Node> = self
                .errors
                .into_iter()
                .map(|(code, message)| {
                    Node::Element(Element::new().attr("code", code.as_str()).text(message))
                })
                .collect();
            root = root.child("error", Node::Sequence(errors));
        }
        root
    }
}
