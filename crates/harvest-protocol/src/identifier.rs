//! Codec for the opaque `oai:HOST:TYPE-ID` record identifier.
//!
//! The codec is pure and performs no I/O. Decoding is strict: every
//! failure mode maps to the protocol's `idDoesNotExist` error at the
//! dispatch layer, but the distinct variants keep diagnostics precise.

use thiserror::Error;

/// Scheme component every identifier must carry.
pub const SCHEME: &str = "oai";

/// Builds the identifier for a record as exposed to harvesters.
#[must_use]
pub fn encode(entity_type: &str, entity_id: &str, host: &str) -> String {
    format!("{SCHEME}:{host}:{entity_type}-{entity_id}")
}

/// Reasons an identifier failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier did not have exactly three colon-delimited
    /// components.
    #[error("identifier '{identifier}' is not of the form oai:HOST:TYPE-ID")]
    Malformed { identifier: String },

    /// The scheme component was not `oai`.
    #[error("identifier scheme '{scheme}' is not '{SCHEME}'")]
    WrongScheme { scheme: String },

    /// The host component named a different repository.
    #[error("identifier host '{host}' does not belong to this repository")]
    WrongHost { host: String },

    /// The trailing component could not be split into a type and a
    /// numeric id.
    #[error("identifier local part '{local}' is not a TYPE-ID pair")]
    BadLocalPart { local: String },
}

/// Decodes an identifier back into its `(entity_type, entity_id)` pair.
///
/// The local part is split on the last `-` so entity types containing
/// hyphens survive the round trip; the id half must be non-empty ASCII
/// digits.
///
/// # Errors
///
/// Returns an [`IdentifierError`] describing the first structural check
/// that failed.
pub fn decode(identifier: &str, expected_host: &str) -> Result<(String, String), IdentifierError> {
    let components: Vec<&str> = identifier.split(':').collect();
    let [scheme, host, local] = components.as_slice() else {
        return Err(IdentifierError::Malformed {
            identifier: identifier.to_string(),
        });
    };

    if *scheme != SCHEME {
        return Err(IdentifierError::WrongScheme {
            scheme: (*scheme).to_string(),
        });
    }
    if *host != expected_host {
        return Err(IdentifierError::WrongHost {
            host: (*host).to_string(),
        });
    }

    let Some((entity_type, entity_id)) = local.rsplit_once('-') else {
        return Err(IdentifierError::BadLocalPart {
            local: (*local).to_string(),
        });
    };
    if entity_type.is_empty()
        || entity_id.is_empty()
        || !entity_id.bytes().all(|byte| byte.is_ascii_digit())
    {
        return Err(IdentifierError::BadLocalPart {
            local: (*local).to_string(),
        });
    }

    Ok((entity_type.to_string(), entity_id.to_string()))
}
