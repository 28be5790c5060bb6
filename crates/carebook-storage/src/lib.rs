//! # carebook-storage
//!
//! Backend abstraction layer for the Carebook data layer.
//!
//! This crate defines the traits and types every backend must implement.
//! It does not contain any implementations - those live in `carebook-db-memory`
//! and `carebook-db-rest`.
//!
//! ## Overview
//!
//! Two traits split the hosted backend into its two halves:
//! - [`RecordStore`]: rows in named collections (select, insert, update, delete)
//!   plus remote procedure calls
//! - [`BlobStore`]: binary objects in named buckets (upload, remove, signed URLs)
//!
//! Rows travel as `serde_json::Value` objects; typing them is the caller's job.
//!
//! ## Example
//!
//! ```ignore
//! use carebook_storage::{Query, RecordStore, StorageError};
//!
//! async fn upcoming(
//!     store: &dyn RecordStore,
//!     patient_id: &str,
//! ) -> Result<Vec<Value>, StorageError> {
//!     let query = Query::new("appointments")
//!         .filter_eq("patient_id", patient_id)
//!         .order_asc("date");
//!     store.select(&query).await
//! }
//! ```

mod error;
mod query;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use query::{Embed, Filter, Query, SortKey, SortOrder};
pub use traits::{BlobStore, RecordStore};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shareable record store trait object.
pub type DynRecordStore = std::sync::Arc<dyn RecordStore>;

/// Shareable blob store trait object.
pub type DynBlobStore = std::sync::Arc<dyn BlobStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::query::{Embed, Filter, Query, SortKey, SortOrder};
    pub use crate::traits::{BlobStore, RecordStore};
    pub use crate::{DynBlobStore, DynRecordStore, StorageResult};
}
