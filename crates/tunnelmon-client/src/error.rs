//! Client error taxonomy

use thiserror::Error;

/// Errors surfaced by the control-API client and the push channel
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, timeout, body)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Daemon answered with a non-2xx status
    #[error("daemon returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Base URL could not be parsed or joined
    #[error("invalid daemon URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Push channel transport failure
    #[error("push channel error: {0}")]
    Channel(String),
}
