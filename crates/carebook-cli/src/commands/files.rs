use std::fs;

use anyhow::{Context, Result};
use carebook_core::FileUpload;
use carebook_gateway::RecordGateway;
use colored::Colorize;

use crate::cli::{FileCommands, OutputFormat, UploadArgs};
use crate::output::{print_record, print_records, print_success, print_warning};

pub async fn run(
    gateway: &RecordGateway,
    command: FileCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        FileCommands::List { patient_id } => {
            let files = gateway.try_get_patient_files(&patient_id).await?;
            print_records(&files, format)?;
        }
        FileCommands::Upload(args) => {
            let patient_id = args.patient_id.clone();
            let upload = read_upload(args)?;
            let file = gateway.try_upload_patient_file(&patient_id, upload).await?;
            print_success(&format!(
                "Uploaded {} as {}",
                file.name.cyan(),
                file.storage_path.cyan()
            ));
            print_record(&file, format)?;
        }
        FileCommands::Delete { file_id } => {
            let deletion = gateway.try_delete_patient_file(&file_id).await?;
            print_success(&format!("Deleted file {}", file_id.cyan()));
            if !deletion.blob_removed {
                print_warning(&format!(
                    "Stored content at {} could not be removed",
                    deletion.file.storage_path
                ));
            }
        }
        FileCommands::Url { storage_path } => {
            let url = gateway.try_get_file_url(&storage_path).await?;
            println!("{url}");
        }
    }
    Ok(())
}

fn read_upload(args: UploadArgs) -> Result<FileUpload> {
    let content = fs::read(&args.path)
        .with_context(|| format!("Failed to read file: {}", args.path.display()))?;
    let file_name = match args.name {
        Some(name) => name,
        None => args
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Upload path has no file name")?,
    };
    let mime = args.mime.unwrap_or_else(|| {
        mime_guess::from_path(&args.path)
            .first_or_octet_stream()
            .to_string()
    });
    Ok(FileUpload::new(file_name, mime, content))
}
