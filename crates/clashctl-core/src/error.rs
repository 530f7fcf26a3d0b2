// ── Core error types ──
//
// User-facing errors from clashctl-core. Consumers never match on raw
// reqwest errors; the `From<clashctl_api::Error>` impl translates
// transport-layer failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to controller timed out")]
    Timeout,

    #[error("Unauthorized: the controller rejected the configured secret")]
    Unauthorized,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// A mutation the daemon did not acknowledge with `204 No Content`.
    #[error("Operation rejected by controller: {operation}")]
    Rejected { operation: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(kind: &str, name: &str) -> Self {
        Self::NotFound {
            kind: kind.to_owned(),
            name: name.to_owned(),
        }
    }

    pub(crate) fn rejected(operation: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<clashctl_api::Error> for CoreError {
    fn from(err: clashctl_api::Error) -> Self {
        match err {
            clashctl_api::Error::Unauthorized => CoreError::Unauthorized,
            clashctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            clashctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            clashctl_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Controller URL cannot be used as a base: {url}"),
            },
            clashctl_api::Error::ClientBuild(message) => CoreError::Config { message },
            clashctl_api::Error::Api { status: 401, .. } => CoreError::Unauthorized,
            clashctl_api::Error::Api { status: 404, message } => CoreError::NotFound {
                kind: "Resource".into(),
                name: message,
            },
            clashctl_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            clashctl_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            clashctl_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
