//! Plain forms of the gateway operations.
//!
//! Each wrapper runs its `try_*` counterpart, logs a failure with its
//! category and returns the empty value for its return type.

use carebook_core::{
    Appointment, AppointmentPatch, FileUpload, MedicalHistory, NewAppointment, NewMedicalHistory,
    NewPatient, Patient, PatientFile, PatientPatch,
};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::RecordGateway;

fn log_failure(operation: &'static str, err: &GatewayError) {
    if err.is_not_found() {
        tracing::warn!(operation, category = %err.category(), error = %err, "record not found");
    } else {
        tracing::error!(
            operation,
            category = %err.category(),
            error = %err,
            "backend operation failed"
        );
    }
}

trait OrLog<T> {
    /// Logs the error and discards it.
    fn or_log(self, operation: &'static str) -> Option<T>;
}

impl<T> OrLog<T> for GatewayResult<T> {
    fn or_log(self, operation: &'static str) -> Option<T> {
        self.map_err(|err| log_failure(operation, &err)).ok()
    }
}

impl RecordGateway {
    pub async fn get_patients(&self) -> Vec<Patient> {
        self.try_get_patients()
            .await
            .or_log("get_patients")
            .unwrap_or_default()
    }

    pub async fn get_medical_history(&self, patient_id: &str) -> Vec<MedicalHistory> {
        self.try_get_medical_history(patient_id)
            .await
            .or_log("get_medical_history")
            .unwrap_or_default()
    }

    pub async fn get_appointments(&self, patient_id: Option<&str>) -> Vec<Appointment> {
        self.try_get_appointments(patient_id)
            .await
            .or_log("get_appointments")
            .unwrap_or_default()
    }

    pub async fn get_patient_files(&self, patient_id: &str) -> Vec<PatientFile> {
        self.try_get_patient_files(patient_id)
            .await
            .or_log("get_patient_files")
            .unwrap_or_default()
    }

    pub async fn get_patient_by_id(&self, id: &str) -> Option<Patient> {
        self.try_get_patient_by_id(id)
            .await
            .or_log("get_patient_by_id")
    }

    pub async fn create_patient(&self, patient: NewPatient) -> Option<Patient> {
        self.try_create_patient(patient).await.or_log("create_patient")
    }

    /// The counter increment is best effort: a record is returned even when
    /// the patient's `treatments` count could not be bumped.
    pub async fn add_medical_history(&self, entry: NewMedicalHistory) -> Option<MedicalHistory> {
        self.try_add_medical_history(entry)
            .await
            .or_log("add_medical_history")
            .map(|added| added.record)
    }

    pub async fn create_appointment(&self, appointment: NewAppointment) -> Option<Appointment> {
        self.try_create_appointment(appointment)
            .await
            .or_log("create_appointment")
    }

    pub async fn update_patient(&self, id: &str, patch: PatientPatch) -> Option<Patient> {
        self.try_update_patient(id, patch)
            .await
            .or_log("update_patient")
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        patch: AppointmentPatch,
    ) -> Option<Appointment> {
        self.try_update_appointment(id, patch)
            .await
            .or_log("update_appointment")
    }

    pub async fn delete_patient(&self, id: &str) -> bool {
        self.try_delete_patient(id)
            .await
            .or_log("delete_patient")
            .is_some()
    }

    pub async fn delete_appointment(&self, id: &str) -> bool {
        self.try_delete_appointment(id)
            .await
            .or_log("delete_appointment")
            .is_some()
    }

    pub async fn upload_patient_file(
        &self,
        patient_id: &str,
        upload: FileUpload,
    ) -> Option<PatientFile> {
        self.try_upload_patient_file(patient_id, upload)
            .await
            .or_log("upload_patient_file")
    }

    /// `true` once the metadata row is gone, even if the blob was orphaned.
    pub async fn delete_patient_file(&self, file_id: &str) -> bool {
        self.try_delete_patient_file(file_id)
            .await
            .or_log("delete_patient_file")
            .is_some()
    }

    pub async fn get_file_url(&self, storage_path: &str) -> Option<String> {
        self.try_get_file_url(storage_path)
            .await
            .or_log("get_file_url")
    }
}
