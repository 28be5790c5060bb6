use anyhow::Result;
use carebook_core::time::format_date;
use carebook_core::{Appointment, MedicalHistory, Patient, PatientFile, format_rfc3339};
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// A record that can be shown as one table row.
pub trait Tabular {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

pub fn print_records<T: Serialize + Tabular>(records: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            print_table(records);
            println!("Total: {}", records.len());
        }
    }
    Ok(())
}

pub fn print_record<T: Serialize + Tabular>(record: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Table => print_table(std::slice::from_ref(record)),
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_table<T: Tabular>(records: &[T]) {
    let mut builder = Builder::default();
    builder.push_record(T::HEADERS.iter().copied());
    for record in records {
        builder.push_record(record.row());
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

impl Tabular for Patient {
    const HEADERS: &'static [&'static str] =
        &["ID", "Name", "Cédula", "Phone", "Email", "Status", "Treatments", "Created"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.cedula.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.status.to_string(),
            self.treatments.to_string(),
            format_rfc3339(self.created_at),
        ]
    }
}

impl Tabular for MedicalHistory {
    const HEADERS: &'static [&'static str] = &["ID", "Date", "Treatment", "Notes", "Evolution"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            format_date(self.date),
            self.treatment.clone(),
            or_dash(self.notes.as_deref()),
            or_dash(self.evolution.as_deref()),
        ]
    }
}

impl Tabular for Appointment {
    const HEADERS: &'static [&'static str] =
        &["ID", "Date", "Time", "Minutes", "Type", "Patient", "Status"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            format_date(self.date),
            self.time.clone(),
            self.duration.to_string(),
            self.kind.clone(),
            or_dash(self.patient_name.as_deref()),
            self.status.to_string(),
        ]
    }
}

impl Tabular for PatientFile {
    const HEADERS: &'static [&'static str] =
        &["ID", "Name", "Type", "Bytes", "Storage path", "Uploaded"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.mime_type.clone(),
            self.size.to_string(),
            self.storage_path.clone(),
            format_rfc3339(self.upload_date),
        ]
    }
}
