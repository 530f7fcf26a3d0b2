//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use clashctl_config::ConfigError;
use clashctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the Clash controller at {url}: {reason}")]
    #[diagnostic(
        code(clashctl::connection_failed),
        help(
            "Check that the daemon is running with `external-controller` enabled.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(clashctl::timeout),
        help("The daemon did not answer in time. Raise --timeout or check the daemon's load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("The controller rejected the secret")]
    #[diagnostic(
        code(clashctl::unauthorized),
        help(
            "Pass --secret, set CLASHCTL_SECRET, or store one with:\n\
             clashctl config set-secret --profile <name>"
        )
    )]
    Unauthorized,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{kind} '{name}' not found")]
    #[diagnostic(
        code(clashctl::not_found),
        help("List what the daemon knows with: clashctl {list_command}")
    )]
    NotFound {
        kind: String,
        name: String,
        list_command: String,
    },

    #[error("The daemon refused to {operation}")]
    #[diagnostic(
        code(clashctl::rejected),
        help(
            "Only Selector groups can be switched, and only to one of their members.\n\
             A wrong --secret is refused the same way."
        )
    )]
    Rejected { operation: String },

    #[error("Controller error: {message}{}", http_suffix(.status))]
    #[diagnostic(code(clashctl::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No daemon configured")]
    #[diagnostic(
        code(clashctl::no_config),
        help(
            "Pass --api http://127.0.0.1:9090, or create a profile with: clashctl config init\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found")]
    #[diagnostic(
        code(clashctl::unknown_profile),
        help("Available profiles: {available}")
    )]
    UnknownProfile { name: String, available: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(clashctl::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(clashctl::config))]
    Config(String),

    // ── Output / IO ──────────────────────────────────────────────────
    #[error("Failed to render output: {0}")]
    #[diagnostic(code(clashctl::output))]
    Output(String),

    #[error(transparent)]
    #[diagnostic(code(clashctl::io))]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(clashctl::internal))]
    Internal(String),
}

#[allow(clippy::ref_option)]
fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Unauthorized => exit_code::AUTH,
            Self::NotFound { .. } | Self::UnknownProfile { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::NoConfig { .. } | Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::Unauthorized => Self::Unauthorized,
            CoreError::NotFound { kind, name } => {
                let list_command = match kind.as_str() {
                    "Group" => "groups list",
                    "Provider" => "providers proxies",
                    _ => "proxies get <name>",
                };
                Self::NotFound {
                    kind,
                    name,
                    list_command: list_command.into(),
                }
            }
            CoreError::Rejected { operation } => Self::Rejected { operation },
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::Config { message } => Self::Config(message),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::UnknownProfile {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let cases = [
            (CoreError::Unauthorized, exit_code::AUTH),
            (CoreError::Timeout, exit_code::TIMEOUT),
            (
                CoreError::ConnectionFailed {
                    url: "http://127.0.0.1:9090".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::NotFound {
                    kind: "Group".into(),
                    name: "Nope".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Rejected {
                    operation: "select HK in Auto".into(),
                },
                exit_code::REJECTED,
            ),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];

        for (core, code) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), code, "{label}");
        }
    }

    #[test]
    fn group_not_found_points_at_groups_list() {
        let err = CliError::from(CoreError::NotFound {
            kind: "Group".into(),
            name: "Nope".into(),
        });
        assert!(matches!(err, CliError::NotFound { ref list_command, .. } if list_command == "groups list"));
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "api".into(),
            reason: "invalid URL".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
