// ── Core error types ──
//
// The reconciliation error taxonomy. Consumers never see HTTP status codes
// or JSON parse failures directly; the `From<catc_api::Error>` impl sorts
// client failures into the kinds the engine reasons about.

use std::fmt;

use catc_api::ControllerVersion;
use serde_json::{Value, json};
use thiserror::Error;

/// One offending field found by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path into the input document, e.g. `config[0].fabric_vlan[1].vlan_id`.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Run-fatal ────────────────────────────────────────────────────
    #[error("invalid input: {}", join_violations(.violations))]
    Input { violations: Vec<Violation> },

    #[error("{feature} requires Catalyst Center {required} or later (controller reports {actual})")]
    VersionUnsupported {
        feature: String,
        required: ControllerVersion,
        actual: ControllerVersion,
    },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Item-fatal ───────────────────────────────────────────────────
    #[error("lookup failed: {message}")]
    Lookup { message: String },

    #[error("{message}")]
    Conflict {
        message: String,
        /// Controller response body, when the rejection came from the wire.
        response: Option<Value>,
    },

    #[error("transient failure: {message}")]
    Transient { message: String },

    // ── Pass-fatal ───────────────────────────────────────────────────
    #[error("task '{task}' failed: {reason}")]
    TaskFailure { task: String, reason: String },

    #[error("task '{task}' did not finish within {timeout_secs}s")]
    Timeout { task: String, timeout_secs: u64 },

    #[error("cancelled")]
    Cancelled,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            response: None,
        }
    }

    /// Input and version errors abort the whole run before any write.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Input { .. }
                | Self::VersionUnsupported { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Config { .. }
        )
    }

    /// Task failures, timeouts and cancellation stop the rest of the
    /// current kind; everything else only fails the item at hand.
    pub fn stops_pass(&self) -> bool {
        self.is_fatal_for_run()
            || matches!(
                self,
                Self::TaskFailure { .. } | Self::Timeout { .. } | Self::Cancelled
            )
    }

    /// Short kind name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input { .. } => "InputError",
            Self::VersionUnsupported { .. } => "VersionUnsupported",
            Self::AuthenticationFailed { .. } => "AuthenticationFailed",
            Self::Config { .. } => "ConfigError",
            Self::Lookup { .. } => "LookupError",
            Self::Conflict { .. } => "Conflict",
            Self::Transient { .. } => "Transient",
            Self::TaskFailure { .. } => "TaskFailure",
            Self::Timeout { .. } => "Timeout",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Structured form for the report's `last_error_response`.
    pub fn to_response(&self) -> Value {
        match self {
            Self::Conflict {
                response: Some(body),
                ..
            } => body.clone(),
            _ => json!({ "error": self.kind(), "message": self.to_string() }),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<catc_api::Error> for CoreError {
    fn from(err: catc_api::Error) -> Self {
        match err {
            catc_api::Error::Authentication { message } => Self::AuthenticationFailed { message },
            catc_api::Error::TokenExpired => Self::AuthenticationFailed {
                message: "token expired or revoked".into(),
            },
            catc_api::Error::Transport(e) => Self::Transient {
                message: e.to_string(),
            },
            catc_api::Error::Tls(message) => Self::Transient {
                message: format!("TLS error: {message}"),
            },
            catc_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid controller URL: {e}"),
            },
            catc_api::Error::Api {
                operation,
                params,
                status,
                message,
            } => {
                if matches!(status, 502..=504) {
                    Self::Transient {
                        message: format!("{operation} (HTTP {status}): {message}"),
                    }
                } else {
                    Self::Conflict {
                        response: Some(json!({
                            "operation": operation,
                            "params": params,
                            "status": status,
                            "message": message,
                        })),
                        message: format!("{operation} rejected: {message}"),
                    }
                }
            }
            catc_api::Error::NotFound { operation } => Self::Lookup {
                message: format!("{operation}: resource not found"),
            },
            catc_api::Error::Deserialization {
                operation,
                message,
                body: _,
            } => Self::Lookup {
                message: format!("{operation}: {message}"),
            },
            catc_api::Error::File { path, source } => Self::Conflict {
                message: format!("cannot read {path}: {source}"),
                response: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn controller_rejection_becomes_conflict_with_body() {
        let err = CoreError::from(catc_api::Error::Api {
            operation: "sda.add_anycast_gateways",
            params: "[]".into(),
            status: 400,
            message: "VN not found".into(),
        });
        assert_eq!(err.kind(), "Conflict");
        assert!(!err.stops_pass());
        assert_eq!(err.to_response()["message"], "VN not found");
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = CoreError::from(catc_api::Error::Api {
            operation: "task.get_task_by_id",
            params: "[]".into(),
            status: 503,
            message: "unavailable".into(),
        });
        assert!(matches!(err, CoreError::Transient { .. }));
    }

    #[test]
    fn unreadable_upload_fails_only_the_item() {
        let err = CoreError::from(catc_api::Error::File {
            path: "/nonexistent/f.png".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(err.kind(), "Conflict");
        assert!(!err.stops_pass());
        assert!(!err.is_fatal_for_run());
        assert!(err.to_string().contains("/nonexistent/f.png"));
    }

    #[test]
    fn task_failures_stop_the_pass_but_not_the_run() {
        let err = CoreError::TaskFailure {
            task: "t".into(),
            reason: "boom".into(),
        };
        assert!(err.stops_pass());
        assert!(!err.is_fatal_for_run());
    }

    #[test]
    fn input_error_lists_every_violation() {
        let err = CoreError::Input {
            violations: vec![
                Violation::new("config[0].fabric_vlan[0].vlan_id", "must be between 2 and 4093"),
                Violation::new("config[1].site.type", "is required"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("vlan_id: must be between 2 and 4093"));
        assert!(text.contains("site.type: is required"));
    }
}
