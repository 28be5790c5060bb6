use anyhow::Result;
use carebook_core::NewMedicalHistory;
use carebook_gateway::RecordGateway;
use colored::Colorize;

use crate::cli::{HistoryCommands, OutputFormat};
use crate::output::{print_record, print_records, print_success, print_warning};

pub async fn run(
    gateway: &RecordGateway,
    command: HistoryCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        HistoryCommands::List { patient_id } => {
            let history = gateway.try_get_medical_history(&patient_id).await?;
            print_records(&history, format)?;
        }
        HistoryCommands::Add(args) => {
            let mut entry = NewMedicalHistory::new(args.patient_id, args.date, args.treatment);
            entry.notes = args.notes;
            entry.evolution = args.evolution;

            let added = gateway.try_add_medical_history(entry).await?;
            print_success(&format!("Added history entry {}", added.record.id.cyan()));
            if !added.treatments_synced {
                print_warning("The patient's treatment count was not updated and is now behind");
            }
            print_record(&added.record, format)?;
        }
    }
    Ok(())
}
