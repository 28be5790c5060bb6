//! Typed operations over the record and blob stores.

use std::sync::Arc;
use std::time::Duration;

use carebook_core::{
    Appointment, AppointmentPatch, Collection, FileUpload, INCREMENT_TREATMENTS_PROCEDURE,
    MedicalHistory, NewAppointment, NewMedicalHistory, NewPatient, Patient, PatientFile,
    PatientPatch, format_rfc3339, now_utc,
};
use carebook_db_rest::RestBackend;
use carebook_storage::{DynBlobStore, DynRecordStore, Embed, Query, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::{GatewayConfig, StorageSettings};
use crate::error::{GatewayError, GatewayResult};

/// Outcome of [`RecordGateway::try_add_medical_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAdded {
    pub record: MedicalHistory,
    /// `false` when the patient's `treatments` counter was not incremented
    /// and now lags behind the history rows.
    pub treatments_synced: bool,
}

/// Outcome of [`RecordGateway::try_delete_patient_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeletion {
    /// The metadata row that was deleted.
    pub file: PatientFile,
    /// `false` when the blob could not be removed and is now orphaned.
    pub blob_removed: bool,
}

/// Gateway over a record store and a blob store.
///
/// Cloning is cheap; clones share the same backend handles.
#[derive(Clone)]
pub struct RecordGateway {
    records: DynRecordStore,
    blobs: DynBlobStore,
    bucket: String,
    signed_url_ttl: Duration,
}

impl std::fmt::Debug for RecordGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordGateway")
            .field("records", &self.records.backend_name())
            .field("blobs", &self.blobs.backend_name())
            .field("bucket", &self.bucket)
            .field("signed_url_ttl", &self.signed_url_ttl)
            .finish()
    }
}

impl RecordGateway {
    pub fn new(records: DynRecordStore, blobs: DynBlobStore, storage: &StorageSettings) -> Self {
        Self {
            records,
            blobs,
            bucket: storage.bucket.clone(),
            signed_url_ttl: storage.signed_url_ttl(),
        }
    }

    /// Builds a gateway over the hosted backend described by `config`.
    ///
    /// The configuration is expected to be validated already.
    pub fn connect(config: &GatewayConfig) -> GatewayResult<Self> {
        let backend = Arc::new(RestBackend::new(
            &config.backend.url,
            config.backend.anon_key.clone(),
            config.backend.timeout(),
        )?);
        tracing::info!(
            url = %backend.base_url(),
            bucket = %config.storage.bucket,
            "gateway connected"
        );
        Ok(Self::new(backend.clone(), backend, &config.storage))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    // ---- List ----------------------------------------------------------

    /// All patients, newest first.
    pub async fn try_get_patients(&self) -> GatewayResult<Vec<Patient>> {
        let query = Query::new(Collection::Patients.as_str()).order_desc("created_at");
        self.select(Collection::Patients, &query).await
    }

    /// History of one patient, most recent visit first.
    pub async fn try_get_medical_history(
        &self,
        patient_id: &str,
    ) -> GatewayResult<Vec<MedicalHistory>> {
        let query = Query::new(Collection::MedicalHistory.as_str())
            .filter_eq("patient_id", patient_id)
            .order_desc("date");
        self.select(Collection::MedicalHistory, &query).await
    }

    /// Appointments in calendar order, optionally for one patient, each
    /// carrying the patient's name.
    pub async fn try_get_appointments(
        &self,
        patient_id: Option<&str>,
    ) -> GatewayResult<Vec<Appointment>> {
        let mut query = Query::new(Collection::Appointments.as_str())
            .order_asc("date")
            .order_asc("time")
            .with_embed(Embed::new(Collection::Patients.as_str(), "patient_id", ["name"]));
        if let Some(patient_id) = patient_id {
            query = query.filter_eq("patient_id", patient_id);
        }

        let rows = self.records.select(&query).await?;
        let appointments = rows
            .into_iter()
            .map(|row| decode(Collection::Appointments, flatten_patient_name(row)))
            .collect::<GatewayResult<Vec<Appointment>>>()?;
        tracing::debug!(operation = "get_appointments", count = appointments.len(), "listed rows");
        Ok(appointments)
    }

    /// Files of one patient, newest upload first.
    pub async fn try_get_patient_files(&self, patient_id: &str) -> GatewayResult<Vec<PatientFile>> {
        let query = Query::new(Collection::PatientFiles.as_str())
            .filter_eq("patient_id", patient_id)
            .order_desc("upload_date");
        self.select(Collection::PatientFiles, &query).await
    }

    // ---- Get -----------------------------------------------------------

    pub async fn try_get_patient_by_id(&self, id: &str) -> GatewayResult<Patient> {
        self.fetch(Collection::Patients, id).await
    }

    // ---- Create --------------------------------------------------------

    pub async fn try_create_patient(&self, patient: NewPatient) -> GatewayResult<Patient> {
        self.insert(Collection::Patients, &patient).await
    }

    /// Inserts a history row, then bumps the patient's `treatments` counter.
    ///
    /// A failed increment is logged and reported through
    /// [`HistoryAdded::treatments_synced`]; the history row is kept.
    pub async fn try_add_medical_history(
        &self,
        entry: NewMedicalHistory,
    ) -> GatewayResult<HistoryAdded> {
        let record: MedicalHistory = self.insert(Collection::MedicalHistory, &entry).await?;

        let args = json!({ "patient_id": record.patient_id });
        let treatments_synced = match self
            .records
            .call(INCREMENT_TREATMENTS_PROCEDURE, &args)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    operation = "add_medical_history",
                    procedure = INCREMENT_TREATMENTS_PROCEDURE,
                    patient_id = %record.patient_id,
                    history_id = %record.id,
                    category = %err.category(),
                    error = %err,
                    "treatments counter not incremented, patient count now lags history"
                );
                false
            }
        };

        Ok(HistoryAdded {
            record,
            treatments_synced,
        })
    }

    pub async fn try_create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> GatewayResult<Appointment> {
        self.insert(Collection::Appointments, &appointment).await
    }

    // ---- Update --------------------------------------------------------

    /// Applies `patch` and stamps `updated_at` with the current time.
    pub async fn try_update_patient(
        &self,
        id: &str,
        patch: PatientPatch,
    ) -> GatewayResult<Patient> {
        self.update(Collection::Patients, id, &patch).await
    }

    /// Applies `patch` and stamps `updated_at` with the current time.
    pub async fn try_update_appointment(
        &self,
        id: &str,
        patch: AppointmentPatch,
    ) -> GatewayResult<Appointment> {
        self.update(Collection::Appointments, id, &patch).await
    }

    // ---- Delete --------------------------------------------------------

    pub async fn try_delete_patient(&self, id: &str) -> GatewayResult<()> {
        self.delete(Collection::Patients, id).await
    }

    pub async fn try_delete_appointment(&self, id: &str) -> GatewayResult<()> {
        self.delete(Collection::Appointments, id).await
    }

    // ---- Files ---------------------------------------------------------

    /// Uploads the content under `{patient_id}/{millis}-{file_name}`, then
    /// records its metadata row.
    ///
    /// If the upload fails no row is written. If the row cannot be written
    /// the blob is removed again before the error is returned.
    pub async fn try_upload_patient_file(
        &self,
        patient_id: &str,
        upload: FileUpload,
    ) -> GatewayResult<PatientFile> {
        let key = upload.storage_key(patient_id, now_utc());
        let metadata = to_row(&upload.metadata(patient_id, key.clone()))?;
        let FileUpload {
            mime_type, content, ..
        } = upload;

        self.blobs
            .upload(&self.bucket, &key, content, &mime_type)
            .await?;
        tracing::debug!(
            operation = "upload_patient_file",
            bucket = %self.bucket,
            key = %key,
            "blob stored"
        );

        let row = match self
            .records
            .insert(Collection::PatientFiles.as_str(), &metadata)
            .await
        {
            Ok(row) => row,
            Err(err) => {
                self.discard_blob(&key).await;
                return Err(err.into());
            }
        };
        decode(Collection::PatientFiles, row)
    }

    /// Removes the blob behind a file row, then the row itself.
    ///
    /// A failed blob removal does not stop the row deletion; the blob is left
    /// orphaned and [`FileDeletion::blob_removed`] is `false`.
    pub async fn try_delete_patient_file(&self, file_id: &str) -> GatewayResult<FileDeletion> {
        let file: PatientFile = self.fetch(Collection::PatientFiles, file_id).await?;

        let keys = std::slice::from_ref(&file.storage_path);
        let blob_removed = match self.blobs.remove(&self.bucket, keys).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    operation = "delete_patient_file",
                    bucket = %self.bucket,
                    key = %file.storage_path,
                    file_id,
                    category = %err.category(),
                    error = %err,
                    "blob removal failed, deleting metadata row anyway"
                );
                false
            }
        };

        self.delete(Collection::PatientFiles, file_id).await?;
        Ok(FileDeletion { file, blob_removed })
    }

    /// Signed read URL for a storage key, valid for the configured TTL.
    pub async fn try_get_file_url(&self, storage_path: &str) -> GatewayResult<String> {
        Ok(self
            .blobs
            .signed_url(&self.bucket, storage_path, self.signed_url_ttl)
            .await?)
    }

    // ---- Helpers -------------------------------------------------------

    async fn select<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> GatewayResult<Vec<T>> {
        let rows = self.records.select(query).await?;
        tracing::debug!(%collection, count = rows.len(), "listed rows");
        rows.into_iter().map(|row| decode(collection, row)).collect()
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> GatewayResult<T> {
        match self.records.select_by_id(collection.as_str(), id).await? {
            Some(row) => decode(collection, row),
            None => Err(GatewayError::not_found(collection, id)),
        }
    }

    async fn insert<T, P>(&self, collection: Collection, payload: &P) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let row = self
            .records
            .insert(collection.as_str(), &to_row(payload)?)
            .await?;
        tracing::debug!(%collection, id = ?row.get("id"), "inserted row");
        decode(collection, row)
    }

    async fn update<T, P>(&self, collection: Collection, id: &str, patch: &P) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let mut changes = to_row(patch)?;
        if let Some(obj) = changes.as_object_mut() {
            obj.insert("updated_at".into(), Value::String(format_rfc3339(now_utc())));
        }

        match self.records.update(collection.as_str(), id, &changes).await? {
            Some(row) => {
                tracing::debug!(%collection, id, "updated row");
                decode(collection, row)
            }
            None => Err(GatewayError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> GatewayResult<()> {
        match self.records.delete(collection.as_str(), id).await? {
            Some(_) => {
                tracing::debug!(%collection, id, "deleted row");
                Ok(())
            }
            None => Err(GatewayError::not_found(collection, id)),
        }
    }

    /// Compensates a stored blob whose metadata row could not be written.
    async fn discard_blob(&self, key: &str) {
        let keys = [key.to_string()];
        match self.blobs.remove(&self.bucket, &keys).await {
            Ok(_) => tracing::warn!(
                operation = "upload_patient_file",
                bucket = %self.bucket,
                key,
                "metadata insert failed, uploaded blob removed"
            ),
            Err(err) => tracing::error!(
                operation = "upload_patient_file",
                bucket = %self.bucket,
                key,
                category = %err.category(),
                error = %err,
                "metadata insert failed and blob removal failed, blob is orphaned"
            ),
        }
    }
}

fn to_row<P: Serialize>(payload: &P) -> GatewayResult<Value> {
    serde_json::to_value(payload).map_err(|e| GatewayError::Storage(StorageError::from(e)))
}

fn decode<T: DeserializeOwned>(collection: Collection, row: Value) -> GatewayResult<T> {
    serde_json::from_value(row).map_err(|e| GatewayError::decode(collection, e))
}

/// Replaces the embedded `patients` object with a flat `patient_name`.
fn flatten_patient_name(mut row: Value) -> Value {
    if let Some(obj) = row.as_object_mut() {
        let name = obj
            .remove(Collection::Patients.as_str())
            .and_then(|patient| patient.get("name").and_then(Value::as_str).map(str::to_string));
        obj.insert(
            "patient_name".into(),
            name.map(Value::String).unwrap_or(Value::Null),
        );
    }
    row
}
