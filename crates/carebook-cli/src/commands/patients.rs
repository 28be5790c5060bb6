use anyhow::Result;
use carebook_core::{NewPatient, PatientPatch};
use carebook_gateway::RecordGateway;
use colored::Colorize;

use crate::cli::{CreatePatientArgs, OutputFormat, PatientCommands, UpdatePatientArgs};
use crate::output::{print_record, print_records, print_success};

pub async fn run(
    gateway: &RecordGateway,
    command: PatientCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        PatientCommands::List => {
            let patients = gateway.try_get_patients().await?;
            print_records(&patients, format)?;
        }
        PatientCommands::Get { id } => {
            let patient = gateway.try_get_patient_by_id(&id).await?;
            print_record(&patient, format)?;
        }
        PatientCommands::Create(args) => {
            let patient = gateway.try_create_patient(new_patient(args)).await?;
            print_success(&format!("Created patient {}", patient.id.cyan()));
            print_record(&patient, format)?;
        }
        PatientCommands::Update(args) => {
            let id = args.id.clone();
            let patch = patient_patch(args);
            if patch.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one field, e.g. --phone");
            }
            let patient = gateway.try_update_patient(&id, patch).await?;
            print_success(&format!("Updated patient {}", patient.id.cyan()));
            print_record(&patient, format)?;
        }
        PatientCommands::Delete { id } => {
            gateway.try_delete_patient(&id).await?;
            print_success(&format!("Deleted patient {}", id.cyan()));
        }
    }
    Ok(())
}

fn new_patient(args: CreatePatientArgs) -> NewPatient {
    let mut patient = NewPatient::new(args.name, args.cedula, args.phone, args.email);
    patient.address = args.address;
    patient.birth_date = args.birth_date;
    patient.gender = args.gender;
    patient.notes = args.notes;
    if let Some(status) = args.status {
        patient.status = status;
    }
    patient
}

fn patient_patch(args: UpdatePatientArgs) -> PatientPatch {
    PatientPatch {
        name: args.name,
        cedula: args.cedula,
        phone: args.phone,
        email: args.email,
        address: args.address,
        birth_date: args.birth_date,
        gender: args.gender,
        treatments: None,
        status: args.status,
        notes: args.notes,
    }
}
