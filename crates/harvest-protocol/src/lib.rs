//! Server-side core of the OAI-PMH metadata-harvesting protocol.
//!
//! The crate implements the verb-driven request/response conversation a
//! data provider holds with external harvesters: argument validation per
//! verb, the resumption-token lifecycle for paginated listings, the
//! record-identifier codec, and assembly of the language-neutral response
//! tree that an external serializer turns into the wire format.
//!
//! Everything stateful lives behind two ports: the [`RecordRepository`]
//! supplies records, sets, and the per-record view capability; the
//! [`TokenStore`] persists resumption tokens between independent
//! requests. Metadata rendering is injected through [`MetadataMapper`],
//! so the core never touches descriptive metadata itself.
//!
//! A transport embeds the crate by building an [`Endpoint`], translating
//! each inbound request into a [`Query`] plus [`RequestContext`], and
//! serializing the returned [`Element`] tree. Protocol failures (bad
//! verbs, expired tokens, unknown identifiers) travel inside the response
//! envelope as the OAI-PMH error list; only infrastructure faults and
//! access denial surface as [`DispatchError`] values for the transport to
//! map onto its own status codes.

pub mod dispatch;
mod endpoint;
pub mod identifier;
mod metadata;
mod repository;
mod response;
mod token_store;

pub use dispatch::{DispatchError, Query};
pub use endpoint::{AccessPolicy, AllowAll, Endpoint, RequestContext};
pub use metadata::{FormatRegistry, MetadataFormat, MetadataMapper, OAI_DC};
pub use repository::{RecordRepository, RepositoryError, RepositoryResult};
pub use response::{Element, ErrorCode, Node, ResponseBuilder, format_datestamp};
pub use token_store::{InMemoryTokenStore, TokenStore, TokenStoreError, TokenStoreResult};
