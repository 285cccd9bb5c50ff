//! Shared HTTP client construction.

use std::time::Duration;

use crate::error::Result;

/// Client with a 10s connect timeout and the given request timeout.
pub fn client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("ragdb/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}

/// Maps a non-success status to the matching error.
pub(crate) fn status_error(provider: &'static str, status: reqwest::StatusCode, body: &str) -> crate::LlmError {
    tracing::error!(provider, %status, body, "chat request failed");
    match status.as_u16() {
        429 => crate::LlmError::RateLimited,
        401 | 403 => crate::LlmError::Auth { status: status.as_u16() },
        code => crate::LlmError::Status { provider, status: code },
    }
}
