//! The inbound request envelope: verb plus simple string arguments.
//!
//! Transports hand the dispatcher the raw query pairs in arrival order.
//! Unknown parameters are ignored per the protocol; for known non-verb
//! parameters the first occurrence wins. The `verb` parameter alone is
//! strict: missing, repeated, or unrecognised values are all terminal
//! `badVerb` conditions.

use thiserror::Error;

use harvest_types::Verb;

/// Parsed query parameters of one protocol request.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Builds a query from key/value pairs in arrival order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// First value supplied for the named parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn occurrences(&self, name: &str) -> usize {
        self.pairs.iter().filter(|(key, _)| key == name).count()
    }

    /// Resolves the request verb.
    ///
    /// # Errors
    ///
    /// Returns a [`VerbError`] when the parameter is missing, repeated,
    /// or not one of the six legal verbs; every case is reported to the
    /// harvester as `badVerb`.
    pub fn verb(&self) -> Result<Verb, VerbError> {
        match self.occurrences("verb") {
            0 => Err(VerbError::Missing),
            1 => {
                let value = self.get("verb").unwrap_or_default();
                Verb::parse(value).ok_or_else(|| VerbError::Illegal {
                    value: value.to_string(),
                })
            }
            _ => Err(VerbError::Repeated),
        }
    }
}

/// Why the verb parameter failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerbError {
    /// No verb parameter was supplied.
    #[error("the verb argument is missing")]
    Missing,
    /// The verb parameter appeared more than once.
    #[error("the verb argument is repeated")]
    Repeated,
    /// The value is not a legal OAI-PMH verb.
    #[error("'{value}' is not a legal OAI-PMH verb")]
    Illegal { value: String },
}
