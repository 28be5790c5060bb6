//! Gateway and configuration error types.

use std::path::PathBuf;

use carebook_core::Collection;
use carebook_storage::{ErrorCategory, StorageError};

/// Errors returned by the `try_*` gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No row with this id exists.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The backend call failed (transport, constraint, permission, timeout...).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The backend returned a row the record type cannot represent.
    #[error("Cannot decode {collection} row: {message}")]
    Decode {
        collection: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: collection.entity(),
            id: id.into(),
        }
    }

    pub fn decode(collection: Collection, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            collection: collection.as_str(),
            message: err.to_string(),
        }
    }

    /// Returns `true` for a missing row, whether the gateway or the backend noticed.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Storage(err) => err.is_not_found(),
            Self::Decode { .. } => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Storage(err) => err.category(),
            Self::Decode { .. } => ErrorCategory::Internal,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
