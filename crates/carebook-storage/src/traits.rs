//! Backend traits for the storage abstraction layer.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::query::Query;

/// Row storage: named collections of JSON objects keyed by `id`.
///
/// Implementations must be thread-safe (`Send + Sync`); every call is an
/// independent request with no ordering guarantee relative to other calls.
///
/// # Example
///
/// ```ignore
/// use carebook_storage::{RecordStore, StorageError};
///
/// async fn get_patient(store: &dyn RecordStore, id: &str) -> Result<Value, StorageError> {
///     store
///         .select_by_id("patients", id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("patients", id))
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every row matching the query, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns an error only for backend or transport failures; no match is
    /// an empty vector.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StorageError>;

    /// Reads one row by primary key.
    ///
    /// Returns `None` if the row does not exist.
    async fn select_by_id(&self, collection: &str, id: &str)
    -> Result<Option<Value>, StorageError>;

    /// Inserts one row and returns it as stored, including the columns the
    /// backend generated (`id`, timestamps).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Constraint` when a reference or column
    /// constraint rejects the row.
    async fn insert(&self, collection: &str, row: &Value) -> Result<Value, StorageError>;

    /// Merges `changes` into the row with the given id and returns the result.
    ///
    /// Returns `None` if no row has that id.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: &Value,
    ) -> Result<Option<Value>, StorageError>;

    /// Deletes the row with the given id and returns it.
    ///
    /// Returns `None` if no row has that id.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError>;

    /// Invokes a remote procedure with named arguments.
    async fn call(&self, procedure: &str, args: &Value) -> Result<Value, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Object storage: binary blobs addressed by bucket and key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `content` under `key`. Existing keys are not overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the key is taken.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Removes the given keys and returns the ones that actually existed.
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StorageError>;

    /// Issues a URL granting read access to `key` for `ttl`.
    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
