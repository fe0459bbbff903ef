// ── Core error types ──
//
// Engine-facing errors from sdnsync-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<sdnsync_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller connection timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Controller not found: {identifier}")]
    ControllerNotFound { identifier: String },

    #[error("Prototype not found: {identifier}")]
    PrototypeNotFound { identifier: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Malformed controller report: {message}")]
    MalformedReport { message: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Repository error: {message}")]
    Repository { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Controller API error: {message}")]
    Api {
        message: String,
        /// The controller-specific error code, when reported.
        code: Option<String>,
        /// HTTP status code (if applicable).
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
    pub fn not_found(entity_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    /// Returns `true` for failures that abort an entire engine pass
    /// (auth or transport trouble reaching the controller).
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::AuthenticationFailed { .. } | Self::Timeout
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sdnsync_api::Error> for CoreError {
    fn from(err: sdnsync_api::Error) -> Self {
        match err {
            sdnsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sdnsync_api::Error::InvalidToken => CoreError::AuthenticationFailed {
                message: "Invalid or expired auth token".into(),
            },
            sdnsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            sdnsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sdnsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sdnsync_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            sdnsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
