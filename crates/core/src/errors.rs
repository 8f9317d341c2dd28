//! Error types shared across the workspace.

use thiserror::Error;

/// Result type alias used throughout the core and storage crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the survey store and its services.
#[derive(Debug, Error)]
pub enum Error {
    /// Local database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote collector error (network failure or non-2xx response)
    #[error("Collector error ({}): {message}", display_status(.status))]
    Collector {
        status: Option<u16>,
        message: String,
    },

    /// Invalid caller input rejected before persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

/// Local database failure detail.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a collector error from status and message.
    pub fn collector(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        Self::Collector {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status if this is a collector error carrying one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Collector { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_error_carries_status() {
        let err = Error::collector(422, "ward is required");
        assert_eq!(err.status_code(), Some(422));
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = Error::collector(None, "connection refused");
        assert_eq!(err.status_code(), None);
    }
}
