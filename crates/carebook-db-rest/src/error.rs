use carebook_storage::StorageError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Error payload shared by the table and storage APIs.
///
/// The table API reports a database error `code` (e.g. `23505`); the storage
/// API reports its own `statusCode`, sometimes behind an HTTP 400.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: Option<Value>,
}

impl ErrorBody {
    fn effective_status(&self, status: StatusCode) -> u16 {
        match &self.status_code {
            Some(Value::String(s)) => s.parse().unwrap_or(status.as_u16()),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(status.as_u16()),
            _ => status.as_u16(),
        }
    }
}

/// Maps an unsuccessful response onto a storage error.
///
/// `collection` and `id` name the target for `NotFound`.
pub(crate) fn status_error(
    status: StatusCode,
    body: &str,
    collection: &str,
    id: &str,
) -> StorageError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.error.clone())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    match parsed.code.as_deref() {
        Some("23505") => return StorageError::already_exists(collection, message),
        Some("23503" | "23502" | "23514") => return StorageError::constraint(message),
        _ => {}
    }

    match parsed.effective_status(status) {
        401 | 403 => StorageError::permission_denied(message),
        404 => StorageError::not_found(collection, id),
        409 => StorageError::already_exists(collection, message),
        400..=499 => StorageError::invalid_record(message),
        _ => StorageError::backend(status.as_u16(), message),
    }
}

/// Maps a failed send onto a storage error.
pub(crate) fn transport_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::timeout(err.to_string())
    } else if err.is_decode() {
        StorageError::serialization(err.to_string())
    } else {
        StorageError::connection(err.to_string())
    }
}
