//! Unified error types for the crate.
//!
//! These cover fallible construction and teardown only. Per-request
//! failures never surface here; they travel inside
//! [`HttpRequestCompletion`](crate::rest::request::HttpRequestCompletion)
//! to the completion handler.

use thiserror::Error;

/// Main error type for pipeline construction and shutdown.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection settings were rejected (e.g. a token that cannot be
    /// encoded as a header value).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task ended abnormally during shutdown.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
