//! Storage error types for the backend abstraction layer.
//!
//! Every backend maps its native failures onto [`StorageError`] so the
//! gateway can tell a missing row from a broken connection.

use std::fmt;

/// Errors that can occur during backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested row or object was not found.
    #[error("Not found: {collection}/{id}")]
    NotFound {
        /// Collection or bucket that was searched.
        collection: String,
        /// Row id or object key.
        id: String,
    },

    /// A row or object with the same key already exists.
    #[error("Already exists in {collection}: {message}")]
    AlreadyExists {
        /// Collection or bucket holding the duplicate.
        collection: String,
        /// Backend description of the conflict.
        message: String,
    },

    /// The backend rejected the write because of a constraint
    /// (foreign key, not-null, check).
    #[error("Constraint violation: {message}")]
    Constraint {
        /// Backend description of the violated constraint.
        message: String,
    },

    /// The backend rejected the request payload.
    #[error("Invalid record: {message}")]
    InvalidRecord {
        /// Description of why the record was rejected.
        message: String,
    },

    /// The access key or backend policies do not allow the operation.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Backend description of the refusal.
        message: String,
    },

    /// Failed to reach the backend.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The backend did not answer in time.
    #[error("Timeout: {message}")]
    Timeout {
        /// Description of the timed out request.
        message: String,
    },

    /// The backend answered with an unexpected server-side failure.
    #[error("Backend error (HTTP {status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Backend description of the failure.
        message: String,
    },

    /// A payload could not be encoded or a response could not be decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Constraint` error.
    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the backend could not be reached or did not answer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Constraint { .. } => ErrorCategory::Validation,
            Self::InvalidRecord { .. } => ErrorCategory::Validation,
            Self::PermissionDenied { .. } => ErrorCategory::Permission,
            Self::Connection { .. } => ErrorCategory::Infrastructure,
            Self::Timeout { .. } => ErrorCategory::Infrastructure,
            Self::Backend { .. } => ErrorCategory::Infrastructure,
            Self::Serialization { .. } => ErrorCategory::Internal,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Row or object not found.
    NotFound,
    /// Duplicate key.
    Conflict,
    /// Rejected payload or violated constraint.
    Validation,
    /// Refused by backend policies.
    Permission,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Permission => write!(f, "permission"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
