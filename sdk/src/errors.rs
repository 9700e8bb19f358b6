//! Error types and handling
//!
//! This module provides the request-level error taxonomy shared by the engine
//! and the HTTP surface. Every variant maps onto exactly one HTTP status via
//! [`PitchErrorExt::http_status`], and carries a short hint that is safe to
//! show to the caller.
//!
//! # Security
//!
//! Error messages never include credentials. Upstream response bodies are
//! scrubbed by the engine before they are wrapped into an error.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, PitchError>;

/// Trait for pitch error extensions
///
/// Provides user-facing hints, recoverability and the HTTP status each error
/// is surfaced with.
pub trait PitchErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// HTTP status code the error is surfaced with
    fn http_status(&self) -> u16;
}

/// Main error type
///
/// # Error Categories
///
/// - **Configuration**: a credential or setting is missing (500)
/// - **Auth**: bearer token missing, malformed or rejected by the store (401)
/// - **Validation**: unknown persona id or malformed request body (400)
/// - **NotFound**: empty or absent conversation (404)
/// - **Upstream**: timeouts (504), transport failures (503), non-2xx replies
///
/// # Examples
///
/// ```
/// use sdk::errors::{PitchError, PitchErrorExt};
///
/// let error = PitchError::NotFound("Conversation not found or empty".to_string());
/// assert_eq!(error.http_status(), 404);
/// assert!(!error.is_recoverable());
///
/// let timeout = PitchError::UpstreamTimeout("Transcription request timed out".to_string());
/// assert_eq!(timeout.http_status(), 504);
/// assert!(timeout.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum PitchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Caller errors
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    // Remote store errors
    #[error("Store error: {0}")]
    Store(String),

    // Provider errors
    #[error("{0}")]
    UpstreamTimeout(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Transcription failed ({status}): {body}")]
    Transcription { status: u16, body: String },

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PitchError {
    /// Non-2xx reply from a provider whose status should not leak to the caller
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// Non-2xx reply from a provider, forwarded with the provider's status
    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl PitchErrorExt for PitchError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "The server is missing a required credential or setting",
            Self::Auth(_) => "Sign in again and retry with a valid bearer token",
            Self::Validation(_) => "Check the request body and try again",
            Self::NotFound(_) => "Start a new pitch session first",
            Self::Store(_) => "The conversation store rejected the operation",
            Self::UpstreamTimeout(_) => "An external provider took too long to respond. Try again",
            Self::UpstreamUnavailable(_) => "An external provider is unreachable. Try again later",
            Self::Upstream { .. } => "An external provider returned an error",
            Self::Transcription { .. } => "The audio could not be transcribed",
            Self::Io(_) => "Internal I/O failure",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout(_) | Self::UpstreamUnavailable(_) | Self::Upstream { .. }
        )
    }

    fn http_status(&self) -> u16 {
        match self {
            Self::Config(_) | Self::Store(_) | Self::Io(_) => 500,
            Self::Auth(_) => 401,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::UpstreamTimeout(_) => 504,
            Self::UpstreamUnavailable(_) => 503,
            Self::Upstream { status, .. } => status.filter(|s| (400..600).contains(s)).unwrap_or(500),
            Self::Transcription { status, .. } => {
                if (400..600).contains(status) {
                    *status
                } else {
                    500
                }
            }
        }
    }
}
