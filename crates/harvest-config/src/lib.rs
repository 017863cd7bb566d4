//! Configuration surface consumed by the OAI-PMH endpoint.
//!
//! The values here are owned by whatever administrative layer fronts the
//! repository; the protocol engine reads them and never writes them back.
//! Defaults live in [`defaults`] so serde deserialisation and
//! [`RepositoryConfig::default`] stay in agreement.

mod defaults;

pub use defaults::{DEFAULT_BASE_PATH, DEFAULT_TOKEN_EXPIRATION_SECS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static description of one OAI-PMH endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Human-readable repository name advertised by `Identify`.
    pub repository_name: String,
    /// Administrative contact advertised by `Identify`.
    pub admin_email: String,
    /// Path under which the endpoint is mounted.
    #[serde(default = "defaults::default_base_path")]
    pub base_path: String,
    /// Seconds until a freshly minted resumption token expires.
    #[serde(default = "defaults::default_token_expiration_secs")]
    pub token_expiration_secs: u64,
    /// Whether the endpoint advertises a set hierarchy at all.
    #[serde(default = "defaults::default_support_sets")]
    pub support_sets: bool,
    /// Administratively configured sources that materialise sets. An
    /// endpoint with no sources has no set hierarchy even when
    /// `support_sets` is on.
    #[serde(default)]
    pub set_sources: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repository_name: String::new(),
            admin_email: String::new(),
            base_path: defaults::default_base_path(),
            token_expiration_secs: defaults::default_token_expiration_secs(),
            support_sets: defaults::default_support_sets(),
            set_sources: Vec::new(),
        }
    }
}

impl RepositoryConfig {
    /// Whether listing requests may filter on sets and `ListSets` may
    /// enumerate them.
    #[must_use]
    pub fn sets_available(&self) -> bool {
        self.support_sets && !self.set_sources.is_empty()
    }

    /// Validates the configuration before the endpoint is brought up.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered; an invalid
    /// configuration must keep the endpoint from serving at all rather
    /// than surfacing protocol errors to harvesters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository_name.trim().is_empty() {
            return Err(ConfigError::MissingRepositoryName);
        }
        if !self.admin_email.contains('@') {
            return Err(ConfigError::InvalidAdminEmail {
                value: self.admin_email.clone(),
            });
        }
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::UnrootedBasePath {
                value: self.base_path.clone(),
            });
        }
        if self.token_expiration_secs == 0 {
            return Err(ConfigError::ZeroTokenExpiration);
        }
        Ok(())
    }
}

/// Errors raised while validating a [`RepositoryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The repository name was empty or whitespace.
    #[error("repository_name must not be empty")]
    MissingRepositoryName,
    /// The admin contact was not a plausible email address.
    #[error("admin_email '{value}' is not a valid email address")]
    InvalidAdminEmail { value: String },
    /// The base path did not start with `/`.
    #[error("base_path '{value}' must start with '/'")]
    UnrootedBasePath { value: String },
    /// Tokens would expire immediately.
    #[error("token_expiration_secs must be greater than zero")]
    ZeroTokenExpiration,
}
