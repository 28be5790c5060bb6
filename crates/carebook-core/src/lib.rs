//! # carebook-core
//!
//! Record shapes for the Carebook patient-management data layer.
//!
//! Every collection the backend exposes has three types here:
//! - the stored record as the backend returns it (`Patient`, `Appointment`, ...)
//! - a create payload without the backend-generated fields (`NewPatient`, ...)
//! - for updatable collections, a patch carrying only the changed fields (`PatientPatch`, ...)

pub mod appointment;
pub mod collection;
pub mod error;
pub mod file;
pub mod history;
pub mod patient;
pub mod time;

pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};
pub use collection::{Collection, INCREMENT_TREATMENTS_PROCEDURE, PATIENT_FILES_BUCKET};
pub use error::{CoreError, Result};
pub use file::{FileUpload, NewPatientFile, PatientFile};
pub use history::{MedicalHistory, NewMedicalHistory};
pub use patient::{Gender, NewPatient, Patient, PatientPatch, PatientStatus};
pub use crate::time::{
    format_rfc3339, normalize_clock_time, now_utc, parse_clock_time, parse_date,
};
