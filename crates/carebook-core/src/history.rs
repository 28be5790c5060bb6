use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::time::iso_date;

/// One treatment entry in a patient's medical history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub id: String,
    pub patient_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub treatment: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub evolution: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedicalHistory {
    pub patient_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub treatment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolution: Option<String>,
}

impl NewMedicalHistory {
    pub fn new(patient_id: impl Into<String>, date: Date, treatment: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            date,
            treatment: treatment.into(),
            notes: None,
            evolution: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_evolution(mut self, evolution: impl Into<String>) -> Self {
        self.evolution = Some(evolution.into());
        self
    }
}
