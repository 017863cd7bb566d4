//! Endpoint wiring and top-level verb routing.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::debug;

use harvest_config::RepositoryConfig;
use harvest_types::{CallerId, Verb};

use crate::dispatch::{DISPATCH_TARGET, DispatchError, Query};
use crate::metadata::{FormatRegistry, MetadataMapper};
use crate::repository::RecordRepository;
use crate::response::{Element, ErrorCode, ResponseBuilder};
use crate::token_store::TokenStore;

/// Coarse endpoint-level access gate.
///
/// Denial is a transport concern (HTTP 403), not a protocol error, so it
/// short-circuits before any envelope is built. Per-record visibility is
/// the repository's `can_view` capability instead.
pub trait AccessPolicy: Send + Sync {
    /// Whether the caller may talk to the endpoint at all.
    fn may_harvest(&self, caller: &CallerId) -> bool;
}

/// Policy admitting every caller; the default for open repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn may_harvest(&self, _caller: &CallerId) -> bool {
        true
    }
}

/// Per-request ambient data supplied by the transport.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Instant the request was received; injected so expiry decisions
    /// are deterministic under test.
    pub now: OffsetDateTime,
    /// Host component used in record identifiers.
    pub host: String,
    /// Scheme and host prefix for the advertised base URL.
    pub scheme_and_host: String,
    /// Caller on whose behalf the request runs.
    pub caller: CallerId,
}

impl RequestContext {
    /// Creates a context stamped with the current UTC time.
    pub fn new(
        scheme_and_host: impl Into<String>,
        host: impl Into<String>,
        caller: CallerId,
    ) -> Self {
        Self {
            now: OffsetDateTime::now_utc(),
            host: host.into(),
            scheme_and_host: scheme_and_host.into(),
            caller,
        }
    }

    /// Overrides the request instant.
    #[must_use]
    pub fn at(mut self, now: OffsetDateTime) -> Self {
        self.now = now;
        self
    }
}

/// One configured OAI-PMH endpoint.
///
/// Holds the read-only configuration and the injected collaborators;
/// each call to [`Endpoint::handle`] is an independent, short-lived
/// conversation sharing state with its peers only through the token
/// store and the repository.
pub struct Endpoint {
    pub(crate) config: RepositoryConfig,
    pub(crate) repository: Arc<dyn RecordRepository>,
    pub(crate) tokens: Arc<dyn TokenStore>,
    pub(crate) formats: FormatRegistry,
    pub(crate) mapper: Arc<dyn MetadataMapper>,
    access: Arc<dyn AccessPolicy>,
}

impl Endpoint {
    /// Wires an endpoint with the default format registry and an
    /// allow-all access policy.
    pub fn new(
        config: RepositoryConfig,
        repository: Arc<dyn RecordRepository>,
        tokens: Arc<dyn TokenStore>,
        mapper: Arc<dyn MetadataMapper>,
    ) -> Self {
        Self {
            config,
            repository,
            tokens,
            formats: FormatRegistry::oai_dc_only(),
            mapper,
            access: Arc::new(AllowAll),
        }
    }

    /// Replaces the access policy.
    #[must_use]
    pub fn with_access_policy(mut self, access: Arc<dyn AccessPolicy>) -> Self {
        self.access = access;
        self
    }

    /// Replaces the format registry.
    #[must_use]
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// The base URL advertised to harvesters for this request.
    pub(crate) fn base_url(&self, ctx: &RequestContext) -> String {
        format!("{}{}", ctx.scheme_and_host, self.config.base_path)
    }

    /// Handles one protocol request.
    ///
    /// Protocol failures come back inside the response tree as the error
    /// list; the `Err` branch carries only access denial and
    /// infrastructure faults for the transport to map.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AccessDenied`] before any payload work
    /// when the caller fails the access gate, or a repository/token-store
    /// fault raised mid-dispatch.
    pub fn handle(&self, ctx: &RequestContext, query: &Query) -> Result<Element, DispatchError> {
        if !self.access.may_harvest(&ctx.caller) {
            return Err(DispatchError::AccessDenied);
        }

        let mut response = ResponseBuilder::new(ctx.now, self.base_url(ctx));
        match query.verb() {
            Ok(verb) => {
                debug!(target: DISPATCH_TARGET, verb = verb.as_str(), "routing verb");
                response.echo_verb(verb);
                match verb {
                    Verb::GetRecord => self.get_record(ctx, query, &mut response)?,
                    Verb::Identify => self.identify(ctx, &mut response)?,
                    Verb::ListIdentifiers => self.list_identifiers(ctx, query, &mut response)?,
                    Verb::ListMetadataFormats => self.list_metadata_formats(&mut response),
                    Verb::ListRecords => self.list_records(ctx, query, &mut response)?,
                    Verb::ListSets => self.list_sets(&mut response)?,
                }
            }
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "rejecting request verb");
                response.error_canonical(ErrorCode::BadVerb);
            }
        }
        Ok(response.finish())
    }
}
