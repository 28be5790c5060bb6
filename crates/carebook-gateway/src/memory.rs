//! In-process backend wired with the clinic schema.

use std::sync::Arc;

use carebook_core::{Collection, INCREMENT_TREATMENTS_PROCEDURE};
use carebook_db_memory::{Generated, InMemoryBlobStore, InMemoryRecordStore};

use crate::config::StorageSettings;
use crate::gateway::RecordGateway;

/// In-memory record and blob stores behaving like the hosted backend:
/// generated ids and timestamps, `patient_id` foreign keys and the
/// treatments counter procedure.
///
/// Both stores stay reachable so tests can inspect rows and blobs or
/// inject failures.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    pub records: Arc<InMemoryRecordStore>,
    pub blobs: Arc<InMemoryBlobStore>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: Arc::new(clinic_schema(InMemoryRecordStore::new())),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }

    /// Gateway over these stores with default storage settings.
    pub fn gateway(&self) -> RecordGateway {
        self.gateway_with(&StorageSettings::default())
    }

    pub fn gateway_with(&self, storage: &StorageSettings) -> RecordGateway {
        RecordGateway::new(self.records.clone(), self.blobs.clone(), storage)
    }
}

fn clinic_schema(store: InMemoryRecordStore) -> InMemoryRecordStore {
    let store = Collection::ALL.into_iter().fold(store, |store, collection| {
        store.with_generated(collection.as_str(), "id", Generated::Uuid)
    });

    let timestamped = [
        Collection::Patients,
        Collection::MedicalHistory,
        Collection::Appointments,
    ];
    let store = timestamped.into_iter().fold(store, |store, collection| {
        store
            .with_generated(collection.as_str(), "created_at", Generated::Now)
            .with_generated(collection.as_str(), "updated_at", Generated::Now)
    });

    let owned = [
        Collection::MedicalHistory,
        Collection::Appointments,
        Collection::PatientFiles,
    ];
    let store = owned.into_iter().fold(store, |store, collection| {
        store.with_foreign_key(collection.as_str(), "patient_id", Collection::Patients.as_str())
    });

    store
        .with_generated(Collection::PatientFiles.as_str(), "upload_date", Generated::Now)
        .with_counter_procedure(
            INCREMENT_TREATMENTS_PROCEDURE,
            Collection::Patients.as_str(),
            "patient_id",
            "treatments",
        )
}
