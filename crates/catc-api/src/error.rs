use thiserror::Error;

/// Top-level error type for the `catc-api` crate.
///
/// Covers every failure mode of a controller call: authentication,
/// transport, controller-reported rejections and malformed bodies.
/// `catc-core` maps these into the reconciliation error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token request failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The token was rejected on a later request.
    #[error("Token expired or revoked -- re-authentication required")]
    TokenExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// Non-2xx response from the controller.
    #[error("{operation} failed (HTTP {status}): {message}")]
    Api {
        /// `family.operation` name, e.g. `sda.add_layer2_virtual_networks`.
        operation: &'static str,
        /// Query parameters sent with the request, rendered for diagnostics.
        params: String,
        status: u16,
        message: String,
    },

    /// The controller answered 404 for a by-id lookup.
    #[error("{operation}: resource not found")]
    NotFound { operation: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("{operation}: deserialization error: {message}")]
    Deserialization {
        operation: &'static str,
        message: String,
        body: String,
    },

    /// Reading a local file for upload failed.
    #[error("Cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if the controller reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Api { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// The controller-reported message, if the controller produced one.
    pub fn controller_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            Self::Deserialization { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The operation name this error was raised for, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Api { operation, .. }
            | Self::NotFound { operation }
            | Self::Deserialization { operation, .. } => Some(operation),
            _ => None,
        }
    }
}
