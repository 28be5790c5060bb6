//! # carebook-gateway
//!
//! The record gateway for the Carebook patient-management data layer.
//!
//! [`RecordGateway`] maps domain operations (list, get, create, update,
//! delete, upload) onto the four backend collections and the
//! `patient-files` bucket. Every operation comes in two forms:
//!
//! - `try_*` returns a [`GatewayResult`] that says what went wrong;
//! - the plain form logs the failure and returns an empty value
//!   (`None`, `false` or an empty list).
//!
//! ## Example
//!
//! ```ignore
//! use carebook_core::NewPatient;
//! use carebook_gateway::{RecordGateway, config::loader::load_config};
//!
//! let config = load_config(None)?;
//! let gateway = RecordGateway::connect(&config)?;
//!
//! let patient = gateway
//!     .try_create_patient(NewPatient::new("Ana Ruiz", "8-123-456", "555-0100", "ana@example.com"))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod observability;
mod sentinel;

pub use config::{BackendSettings, GatewayConfig, LoggingSettings, StorageSettings};
pub use error::{ConfigError, GatewayError, GatewayResult};
pub use gateway::{FileDeletion, HistoryAdded, RecordGateway};
pub use memory::MemoryBackend;
