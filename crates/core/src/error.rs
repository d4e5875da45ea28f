//! Error types for the CardSense domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each remote collaborator has its own error type.

use thiserror::Error;

/// The top-level error type for fatal CardSense failures.
///
/// Soft failures of a chat exchange (service errors, empty answers) are not
/// errors: they are reported through [`crate::ReplyOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    // --- Remote service errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Handle store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the hosted completion / knowledge-base service.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures reading or writing the durable handle store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Store is read-only: {0}")]
    ReadOnly(String),
}
