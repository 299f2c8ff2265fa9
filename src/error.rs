use thiserror::Error;

/// Failure reaching or decoding the control-plane status API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("status request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("status API returned HTTP {0}")]
    Status(u16),
    #[error("malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure handing a message to the chat gateway.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned HTTP {0}")]
    Status(u16),
}

/// Failure during the gateway WebUI login handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login endpoint returned HTTP {0}")]
    Status(u16),
    #[error("login response carried no credential")]
    MissingCredential,
    #[error("gateway reports the account is not logged in")]
    NotLoggedIn,
}

/// Missing or invalid configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("required config value `{0}` is missing or empty")]
    Missing(&'static str),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
