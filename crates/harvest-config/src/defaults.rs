//! Default values shared by serde deserialisation and `Default`.

/// Default mount path for the endpoint.
pub const DEFAULT_BASE_PATH: &str = "/oai/request";

/// Default resumption-token lifetime in seconds.
pub const DEFAULT_TOKEN_EXPIRATION_SECS: u64 = 3600;

/// Owned base-path default used by serde.
pub fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

/// Token-lifetime default used by serde.
pub fn default_token_expiration_secs() -> u64 {
    DEFAULT_TOKEN_EXPIRATION_SECS
}

/// Set support is advertised unless explicitly disabled.
pub fn default_support_sets() -> bool {
    true
}
