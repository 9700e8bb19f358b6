//! Shared HTTP helpers for the provider adapters

use crate::secrets::scrub;
use sdk::errors::PitchError;

/// Maps a transport-level reqwest failure onto the upstream error taxonomy.
///
/// Timeouts become 504, everything else (DNS, refused connection, TLS) 503.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> PitchError {
    if error.is_timeout() {
        tracing::warn!("{} request timed out", provider);
        PitchError::UpstreamTimeout(format!("{} request timed out", provider))
    } else {
        tracing::warn!("Failed to reach {}: {}", provider, scrub(&error.to_string()));
        PitchError::UpstreamUnavailable(format!(
            "Failed to connect to {}: {}",
            provider,
            scrub(&error.to_string())
        ))
    }
}

/// Reads a non-success response body for error reporting, scrubbed of secrets
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    scrub(&text)
}

/// Joins a base URL and a path without doubling the slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
