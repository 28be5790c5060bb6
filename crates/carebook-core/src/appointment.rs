use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

use crate::error::CoreError;
use crate::time::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmada,
    #[default]
    Pendiente,
    Cancelada,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmada => write!(f, "confirmada"),
            AppointmentStatus::Pendiente => write!(f, "pendiente"),
            AppointmentStatus::Cancelada => write!(f, "cancelada"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirmada" => Ok(AppointmentStatus::Confirmada),
            "pendiente" => Ok(AppointmentStatus::Pendiente),
            "cancelada" => Ok(AppointmentStatus::Cancelada),
            _ => Err(CoreError::invalid_value("status", s)),
        }
    }
}

/// An appointment row.
///
/// `patient_name` is not a column: list queries join it from `patients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Time of day as the backend returns it (`HH:MM` or `HH:MM:SS`).
    pub time: String,
    /// Length in minutes.
    pub duration: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub time: String,
    pub duration: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl NewAppointment {
    /// Creates a pending appointment.
    pub fn new(
        patient_id: impl Into<String>,
        date: Date,
        time: impl Into<String>,
        duration: i32,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            date,
            time: time.into(),
            duration,
            kind: kind.into(),
            notes: None,
            status: AppointmentStatus::default(),
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

impl AppointmentPatch {
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
    fn test_appointment_type_field_is_renamed() {
        let payload = NewAppointment::new("p1", date!(2024 - 07 - 01), "09:30", 45, "Control");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "Control");
        assert_eq!(value["status"], "pendiente");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_appointment_with_joined_name() {
        let row = json!({
            "id": "a1",
            "patient_id": "p1",
            "date": "2024-07-01",
            "time": "09:30:00",
            "duration": 30,
            "type": "Consulta",
            "notes": null,
            "status": "confirmada",
            "created_at": "2024-06-01T08:00:00Z",
            "updated_at": "2024-06-01T08:00:00Z",
            "patient_name": "Ana Ruiz"
        });
        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Confirmada);
        assert_eq!(appointment.patient_name.as_deref(), Some("Ana Ruiz"));
    }

    #[test]
    fn test_cancel_patch() {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelada),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"status": "cancelada"}));
    }
}
