pub mod appointments;
pub mod files;
pub mod history;
pub mod patients;
