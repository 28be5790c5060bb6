use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

use crate::error::CoreError;
use crate::time::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Masculino,
    Femenino,
    Otro,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Masculino => write!(f, "Masculino"),
            Gender::Femenino => write!(f, "Femenino"),
            Gender::Otro => write!(f, "Otro"),
        }
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "masculino" => Ok(Gender::Masculino),
            "femenino" => Ok(Gender::Femenino),
            "otro" => Ok(Gender::Otro),
            _ => Err(CoreError::invalid_value("gender", s)),
        }
    }
}

/// Care status of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PatientStatus {
    #[default]
    Activo,
    Seguimiento,
    Alta,
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientStatus::Activo => write!(f, "Activo"),
            PatientStatus::Seguimiento => write!(f, "Seguimiento"),
            PatientStatus::Alta => write!(f, "Alta"),
        }
    }
}

impl FromStr for PatientStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "activo" => Ok(PatientStatus::Activo),
            "seguimiento" => Ok(PatientStatus::Seguimiento),
            "alta" => Ok(PatientStatus::Alta),
            _ => Err(CoreError::invalid_value("status", s)),
        }
    }
}

/// A patient row.
///
/// `treatments` mirrors the number of medical history rows. It is bumped by a
/// separate remote call after each history insert, so it can lag behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    /// National identity number.
    pub cedula: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<Date>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub treatments: i32,
    pub status: PatientStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Rows written before the column had a default carry `null` here.
fn null_as_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert payload for a patient; the backend assigns `id` and the timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub cedula: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub treatments: i32,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewPatient {
    /// Creates an active patient with no treatments and no optional fields.
    pub fn new(
        name: impl Into<String>,
        cedula: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cedula: cedula.into(),
            phone: phone.into(),
            email: email.into(),
            address: None,
            birth_date: None,
            gender: None,
            treatments: 0,
            status: PatientStatus::default(),
            notes: None,
        }
    }

    pub fn with_status(mut self, status: PatientStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_birth_date(mut self, birth_date: Date) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update for a patient. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cedula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatments: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PatientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PatientPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn test_patient_deserializes_backend_row() {
        let row = json!({
            "id": "7f1c",
            "name": "Ana Ruiz",
            "cedula": "001",
            "phone": "555",
            "email": "a@x.co",
            "address": null,
            "birth_date": "1988-02-29",
            "gender": "Femenino",
            "treatments": 2,
            "status": "Seguimiento",
            "notes": null,
            "created_at": "2024-05-01T09:15:00.123456+00:00",
            "updated_at": "2024-05-02T10:00:00+00:00"
        });
        let patient: Patient = serde_json::from_value(row).unwrap();
        assert_eq!(patient.birth_date, Some(date!(1988 - 02 - 29)));
        assert_eq!(patient.gender, Some(Gender::Femenino));
        assert_eq!(patient.status, PatientStatus::Seguimiento);
        assert_eq!(patient.treatments, 2);
        assert!(patient.address.is_none());
    }

    #[test]
    fn test_null_treatments_count_as_zero() {
        let row = json!({
            "id": "7f1d",
            "name": "Luis Gómez",
            "cedula": "002",
            "phone": "556",
            "email": "l@x.co",
            "treatments": null,
            "status": "Activo",
            "created_at": "2024-05-01T09:15:00Z",
            "updated_at": "2024-05-01T09:15:00Z"
        });
        let patient: Patient = serde_json::from_value(row).unwrap();
        assert_eq!(patient.treatments, 0);
    }

    #[test]
    fn test_new_patient_omits_unset_optionals() {
        let payload = NewPatient::new("Ana Ruiz", "001", "555", "a@x.co");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Ana Ruiz",
                "cedula": "001",
                "phone": "555",
                "email": "a@x.co",
                "treatments": 0,
                "status": "Activo"
            })
        );
    }

    #[test]
    fn test_patch_serializes_only_changed_fields() {
        let patch = PatientPatch {
            phone: Some("555-0101".into()),
            status: Some(PatientStatus::Alta),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"phone": "555-0101", "status": "Alta"})
        );
        assert!(!patch.is_empty());
        assert!(PatientPatch::default().is_empty());
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("alta".parse::<PatientStatus>().unwrap(), PatientStatus::Alta);
        assert_eq!("OTRO".parse::<Gender>().unwrap(), Gender::Otro);
        assert!("unknown".parse::<PatientStatus>().is_err());
    }
}
