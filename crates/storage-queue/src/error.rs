//! Error types for queue operations.

use std::time::Duration;
use thiserror::Error;

/// Comprehensive error type for all queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// The caller-configured deadline fired before the round trip completed.
    /// Distinct from [`QueueError::Service`] so callers can tell "the service
    /// rejected this" apart from "I gave up waiting".
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and a retry layer above may retry it
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Service(err) => err.is_transient(),
            Self::Timeout { .. } => true,
            Self::Validation(_) => false,
        }
    }
}

/// Failures attributable to the remote service or the path to it.
///
/// A successful status with an undecodable body is still a protocol
/// violation by the remote side, so decode failures live here as
/// [`ServiceError::Malformed`] rather than in a separate taxonomy.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("status {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("malformed response: {message}")]
    Malformed { message: String },

    #[error("network failure: {message}")]
    Network { message: String },
}

impl ServiceError {
    /// Check if error is transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed { .. } => false,
            Self::Network { .. } => true,
        }
    }
}

/// Construction-time configuration errors; never recovered automatically
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid account key: {message}")]
    InvalidAccountKey { message: String },

    #[error("invalid service URL '{url}': {message}")]
    InvalidServiceUrl { url: String, message: String },

    #[error("missing required configuration: {key}")]
    Missing { key: String },

    #[error("HTTP client construction failed: {message}")]
    HttpClient { message: String },
}

/// Local input validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("required field missing: {field}")]
    Required { field: String },

    #[error("invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
