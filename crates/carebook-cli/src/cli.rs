use std::path::PathBuf;

use carebook_core::{AppointmentStatus, Gender, PatientStatus, normalize_clock_time, parse_date};
use clap::{Parser, Subcommand, ValueEnum};
use time::Date;

#[derive(Parser)]
#[command(name = "carebook")]
#[command(about = "Carebook CLI: manage patients and their records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML config file (defaults to ./carebook.toml if present)
    #[arg(short, long, global = true, env = "CAREBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage patients
    Patients(PatientsArgs),
    /// Read and add medical history entries
    History(HistoryArgs),
    /// Manage appointments
    Appointments(AppointmentsArgs),
    /// Manage patient files
    Files(FilesArgs),
}

// ---- patients ----------------------------------------------------------

#[derive(clap::Args)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: PatientCommands,
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// List all patients, newest first
    List,
    /// Show one patient
    Get { id: String },
    /// Register a patient
    Create(CreatePatientArgs),
    /// Change fields of a patient
    Update(UpdatePatientArgs),
    /// Delete a patient
    Delete { id: String },
}

#[derive(clap::Args)]
pub struct CreatePatientArgs {
    #[arg(long)]
    pub name: String,
    /// National identity number
    #[arg(long)]
    pub cedula: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub address: Option<String>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub birth_date: Option<Date>,
    /// Masculino, Femenino or Otro
    #[arg(long)]
    pub gender: Option<Gender>,
    /// Activo, Seguimiento or Alta
    #[arg(long)]
    pub status: Option<PatientStatus>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdatePatientArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cedula: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub birth_date: Option<Date>,
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long)]
    pub status: Option<PatientStatus>,
    #[arg(long)]
    pub notes: Option<String>,
}

// ---- history -----------------------------------------------------------

#[derive(clap::Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommands,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List a patient's history, most recent first
    List { patient_id: String },
    /// Record a treatment
    Add(AddHistoryArgs),
}

#[derive(clap::Args)]
pub struct AddHistoryArgs {
    pub patient_id: String,
    /// Visit date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: Date,
    #[arg(long)]
    pub treatment: String,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub evolution: Option<String>,
}

// ---- appointments ------------------------------------------------------

#[derive(clap::Args)]
pub struct AppointmentsArgs {
    #[command(subcommand)]
    pub command: AppointmentCommands,
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// List appointments in calendar order
    List {
        /// Only this patient's appointments
        #[arg(long)]
        patient: Option<String>,
    },
    /// Book an appointment
    Create(CreateAppointmentArgs),
    /// Change fields of an appointment
    Update(UpdateAppointmentArgs),
    /// Delete an appointment
    Delete { id: String },
}

#[derive(clap::Args)]
pub struct CreateAppointmentArgs {
    pub patient_id: String,
    /// Day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: Date,
    /// Start time (HH:MM)
    #[arg(long, value_parser = normalize_clock_time)]
    pub time: String,
    /// Duration in minutes
    #[arg(long, default_value_t = 30)]
    pub duration: i32,
    /// Appointment type
    #[arg(long = "type")]
    pub kind: String,
    #[arg(long)]
    pub notes: Option<String>,
    /// confirmada, pendiente or cancelada
    #[arg(long)]
    pub status: Option<AppointmentStatus>,
}

#[derive(clap::Args)]
pub struct UpdateAppointmentArgs {
    pub id: String,
    #[arg(long)]
    pub patient_id: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<Date>,
    #[arg(long, value_parser = normalize_clock_time)]
    pub time: Option<String>,
    #[arg(long)]
    pub duration: Option<i32>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub status: Option<AppointmentStatus>,
}

// ---- files -------------------------------------------------------------

#[derive(clap::Args)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FileCommands,
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// List a patient's files, newest first
    List { patient_id: String },
    /// Upload a local file for a patient
    Upload(UploadArgs),
    /// Delete a file and its stored content
    Delete { file_id: String },
    /// Print a temporary download URL for a storage path
    Url { storage_path: String },
}

#[derive(clap::Args)]
pub struct UploadArgs {
    pub patient_id: String,
    pub path: PathBuf,
    /// MIME type (guessed from the extension if omitted)
    #[arg(long)]
    pub mime: Option<String>,
    /// Name to store the file under (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
}
