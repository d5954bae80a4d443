//! Error types for playlist-import.
//!
//! The retry policy dispatches on [`Error::is_transient`]: transport
//! failures and rate-limit/server responses are worth another attempt,
//! everything else surfaces immediately.

use thiserror::Error;

/// Main error type for playlist-import.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection or read-timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP response from the catalog API.
    #[error("catalog request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Missing/invalid credentials or a rejected token refresh.
    /// Fatal to a mapping run — no further catalog calls can succeed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response arrived but its payload was not the expected shape.
    #[error("unexpected catalog response: {0}")]
    Payload(String),

    /// Settings / credentials loading errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or invalid persisted artifact.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a retry could plausibly succeed: connection errors, read
    /// timeouts, HTTP 429 and HTTP 5xx. Other 4xx responses and every
    /// non-network error are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let mut body = response.into_string().unwrap_or_default();
                body.truncate(200);
                Error::Status { status, body }
            }
            ureq::Error::Transport(transport) => Error::Transport(transport.to_string()),
        }
    }
}

/// Convenience Result type using the playlist-import [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        assert!(Error::Status { status: 429, body: String::new() }.is_transient());
        assert!(Error::Status { status: 500, body: String::new() }.is_transient());
        assert!(Error::Status { status: 503, body: String::new() }.is_transient());
        assert!(Error::Transport("connection reset".into()).is_transient());
    }

    #[test]
    fn client_errors_and_auth_are_permanent() {
        assert!(!Error::Status { status: 400, body: String::new() }.is_transient());
        assert!(!Error::Status { status: 404, body: String::new() }.is_transient());
        assert!(!Error::Auth("bad refresh token".into()).is_transient());
        assert!(!Error::Payload("missing field".into()).is_transient());
    }
}
