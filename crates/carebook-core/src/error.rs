use thiserror::Error;

/// Errors raised while building or parsing record values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected HH:MM or HH:MM:SS")]
    InvalidTime(String),
}

impl CoreError {
    /// Create a new InvalidValue error
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
