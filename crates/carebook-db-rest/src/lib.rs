//! Hosted REST backend for the Carebook data layer.
//!
//! [`RestBackend`] talks to a hosted database-as-a-service: records through
//! its table API under `/rest/v1` and files through its object storage API
//! under `/storage/v1`. Every request carries the project's anonymous key as
//! both the `apikey` header and a bearer token.
//!
//! HTTP failures are mapped onto [`StorageError`] so callers never see
//! transport types.

mod backend;
mod error;

pub use backend::RestBackend;

pub use carebook_storage::{BlobStore, RecordStore, StorageError};
