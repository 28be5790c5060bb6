//! In-memory backend for the Carebook data layer.
//!
//! This crate implements both [`RecordStore`] and [`BlobStore`] from
//! `carebook-storage` in process, using papaya lock-free maps for concurrent
//! access. It backs the gateway tests and local runs without a hosted backend.
//!
//! Behaviour the hosted backend provides through its schema is opted into per
//! collection: generated columns, foreign keys checked on write, and counter
//! procedures. Every operation can be made to fail with [`FailPoint`] so
//! callers can exercise their error paths.
//!
//! # Example
//!
//! ```ignore
//! use carebook_db_memory::{Generated, InMemoryRecordStore};
//! use carebook_storage::RecordStore;
//!
//! let store = InMemoryRecordStore::new()
//!     .with_generated("patients", "id", Generated::Uuid)
//!     .with_generated("patients", "created_at", Generated::Now);
//!
//! let row = store.insert("patients", &serde_json::json!({"name": "Ana"})).await?;
//! ```

mod blobs;
mod faults;
mod ordering;
mod records;

pub use blobs::{InMemoryBlobStore, StoredBlob};
pub use faults::FailPoint;
pub use records::{Generated, InMemoryRecordStore, Procedure};

// Re-export the traits for convenience
pub use carebook_storage::{BlobStore, RecordStore, StorageError};
