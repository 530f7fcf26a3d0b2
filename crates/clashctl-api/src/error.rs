use thiserror::Error;

/// Top-level error type for the `clashctl-api` crate.
///
/// Covers every failure mode of the controller API: transport, HTTP status,
/// WebSocket streams, and payload decoding. `clashctl-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The daemon rejected the bearer secret (HTTP 401).
    #[error("Unauthorized -- the controller rejected the configured secret")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry path segments (e.g. `data:` or `mailto:` URLs).
    #[error("Controller URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    /// Building the HTTP client failed (TLS backend, header values).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Controller API ──────────────────────────────────────────────
    /// Non-success status on a read endpoint.
    #[error("Controller API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the controller rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Api { status: 401, .. })
    }

    /// Returns `true` if this is a transient error a caller might retry.
    ///
    /// The client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        let err = Error::Api {
            status: 404,
            message: "resource not found".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "busy".into(),
        };
        assert!(err.is_transient());
        assert!(Error::WebSocketConnect("refused".into()).is_transient());
    }

    #[test]
    fn unauthorized_detection() {
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(
            Error::Api {
                status: 401,
                message: String::new()
            }
            .is_unauthorized()
        );
        assert!(!Error::InvalidBaseUrl("x".into()).is_unauthorized());
    }
}
