//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use catc_config::ConfigError;
use catc_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const UNSUPPORTED: i32 = 9;
    pub const PARTIAL: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("The input document has {count} problem(s)")]
    #[diagnostic(code(catc::input), help("{details}"))]
    Input { count: usize, details: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(catc::validation))]
    Validation { field: String, reason: String },

    #[error("Input document not found: {path}")]
    #[diagnostic(code(catc::no_document), help("Pass the path of a YAML or JSON document."))]
    DocumentNotFound { path: String },

    #[error("No {field} configured")]
    #[diagnostic(
        code(catc::missing),
        help("Set `{field}` in the document, in a profile, or export {env}.")
    )]
    Missing { field: &'static str, env: &'static str },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(code(catc::profile_not_found), help("Available profiles: {available}"))]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(catc::config))]
    Config(Box<figment::Error>),

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(catc::auth_failed),
        help("Verify the username and password for this controller.")
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(catc::no_credentials),
        help("Set CATC_PASSWORD, or password_env in the profile.")
    )]
    NoCredentials { profile: String },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Could not reach the controller: {message}")]
    #[diagnostic(
        code(catc::connection_failed),
        help(
            "Check that the controller is reachable.\n\
             For self-signed certificates use --insecure (-k) or `verify: false`."
        )
    )]
    ConnectionFailed { message: String },

    #[error("{message}")]
    #[diagnostic(code(catc::unsupported), help("Upgrade the controller or drop the affected items."))]
    Unsupported { message: String },

    #[error("{message}")]
    #[diagnostic(code(catc::conflict))]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(catc::api_error))]
    Api { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(catc::timeout),
        help("Raise task_timeout in the document or check the controller's task list.")
    )]
    Timeout { message: String },

    #[error("Interrupted")]
    #[diagnostic(code(catc::cancelled))]
    Cancelled,

    // ── Outcome ──────────────────────────────────────────────────────
    #[error("{failed} item(s) failed")]
    #[diagnostic(code(catc::partial_failure), help("{summary}"))]
    PartialFailure { failed: usize, summary: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(catc::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(catc::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input { .. }
            | Self::Validation { .. }
            | Self::DocumentNotFound { .. }
            | Self::Missing { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Missing { field, env } => Self::Missing { field, env },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::DocumentNotFound { path } => Self::DocumentNotFound {
                path: path.display().to_string(),
            },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Input { violations } => Self::Input {
                count: violations.len(),
                details: violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            CoreError::VersionUnsupported { .. } => Self::Unsupported { message },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Config { message } => Self::Validation {
                field: "controller".into(),
                reason: message,
            },
            CoreError::Transient { message } => Self::ConnectionFailed { message },
            CoreError::Conflict { .. } => Self::Conflict { message },
            CoreError::Timeout { .. } => Self::Timeout { message },
            CoreError::Cancelled => Self::Cancelled,
            CoreError::Lookup { .. } | CoreError::TaskFailure { .. } => Self::Api { message },
        }
    }
}
