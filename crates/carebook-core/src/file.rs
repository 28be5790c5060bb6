use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::time::unix_millis;

/// Metadata row for a blob in the patient-files bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFile {
    pub id: String,
    pub patient_id: String,
    /// Original file name as uploaded.
    pub name: String,
    /// Declared MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Key of the blob inside the bucket.
    pub storage_path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
}

/// Insert payload for the metadata row written after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatientFile {
    pub patient_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub storage_path: String,
}

/// A file the caller wants stored for a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Storage key `{patient_id}/{millis}-{file_name}`.
    ///
    /// Two uploads of the same name for the same patient within one
    /// millisecond collide.
    pub fn storage_key(&self, patient_id: &str, at: OffsetDateTime) -> String {
        format!("{patient_id}/{}-{}", unix_millis(at), self.file_name)
    }

    /// Metadata row describing this upload once stored under `storage_path`.
    pub fn metadata(&self, patient_id: &str, storage_path: impl Into<String>) -> NewPatientFile {
        NewPatientFile {
            patient_id: patient_id.to_string(),
            name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
            storage_path: storage_path.into(),
        }
    }
}
