use anyhow::Result;
use carebook_core::{AppointmentPatch, NewAppointment};
use carebook_gateway::RecordGateway;
use colored::Colorize;

use crate::cli::{AppointmentCommands, CreateAppointmentArgs, OutputFormat};
use crate::output::{print_record, print_records, print_success};

pub async fn run(
    gateway: &RecordGateway,
    command: AppointmentCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AppointmentCommands::List { patient } => {
            let appointments = gateway.try_get_appointments(patient.as_deref()).await?;
            print_records(&appointments, format)?;
        }
        AppointmentCommands::Create(args) => {
            let appointment = gateway.try_create_appointment(new_appointment(args)).await?;
            print_success(&format!("Booked appointment {}", appointment.id.cyan()));
            print_record(&appointment, format)?;
        }
        AppointmentCommands::Update(args) => {
            let patch = AppointmentPatch {
                patient_id: args.patient_id,
                date: args.date,
                time: args.time,
                duration: args.duration,
                kind: args.kind,
                notes: args.notes,
                status: args.status,
            };
            if patch.is_empty() {
                anyhow::bail!(
                    "Nothing to update. Pass at least one field, e.g. --status confirmada"
                );
            }
            let appointment = gateway.try_update_appointment(&args.id, patch).await?;
            print_success(&format!("Updated appointment {}", appointment.id.cyan()));
            print_record(&appointment, format)?;
        }
        AppointmentCommands::Delete { id } => {
            gateway.try_delete_appointment(&id).await?;
            print_success(&format!("Deleted appointment {}", id.cyan()));
        }
    }
    Ok(())
}

fn new_appointment(args: CreateAppointmentArgs) -> NewAppointment {
    let mut appointment =
        NewAppointment::new(args.patient_id, args.date, args.time, args.duration, args.kind);
    appointment.notes = args.notes;
    if let Some(status) = args.status {
        appointment.status = status;
    }
    appointment
}
