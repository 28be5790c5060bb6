use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Object-storage bucket holding the uploaded patient documents.
pub const PATIENT_FILES_BUCKET: &str = "patient-files";

/// Remote procedure that bumps `patients.treatments` by one.
pub const INCREMENT_TREATMENTS_PROCEDURE: &str = "increment_patient_treatments";

/// The logical collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Patients,
    MedicalHistory,
    Appointments,
    PatientFiles,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Patients,
        Collection::MedicalHistory,
        Collection::Appointments,
        Collection::PatientFiles,
    ];

    /// Wire name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::MedicalHistory => "medical_history",
            Collection::Appointments => "appointments",
            Collection::PatientFiles => "patient_files",
        }
    }

    /// Entity name used in log lines and error messages.
    pub fn entity(&self) -> &'static str {
        match self {
            Collection::Patients => "Patient",
            Collection::MedicalHistory => "MedicalHistory",
            Collection::Appointments => "Appointment",
            Collection::PatientFiles => "PatientFile",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::invalid_value("collection", s))
    }
}
