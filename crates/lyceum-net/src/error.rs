use thiserror::Error;

/// Errors produced while talking to the classroom server.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server responded {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server { status: u16, message: Option<String> },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// A 2xx response that carried `null` where a value was required.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client could not be built from the given settings.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Pull a human-readable message out of an error body.
///
/// Looks for an `error`, `exception` or `message` string field in a JSON
/// object. Anything else (empty body, HTML, plain text) is opaque.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;
    ["error", "exception", "message"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
