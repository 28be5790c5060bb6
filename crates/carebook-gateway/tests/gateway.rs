//! Gateway behaviour against the in-memory backend.

use std::time::Duration;

use carebook_core::{
    AppointmentPatch, AppointmentStatus, Collection, FileUpload, INCREMENT_TREATMENTS_PROCEDURE,
    NewAppointment, NewMedicalHistory, NewPatient, PatientPatch, PatientStatus,
};
use carebook_db_memory::FailPoint;
use carebook_gateway::{GatewayError, MemoryBackend, RecordGateway};
use time::macros::date;

fn ana() -> NewPatient {
    NewPatient::new("Ana Ruiz", "001", "555", "a@x.co").with_status(PatientStatus::Activo)
}

async fn seeded() -> (MemoryBackend, RecordGateway, String) {
    let backend = MemoryBackend::new();
    let gateway = backend.gateway();
    let patient = gateway.create_patient(ana()).await.unwrap();
    (backend, gateway, patient.id)
}

#[tokio::test]
async fn ana_ruiz_round_trip() {
    let gateway = MemoryBackend::new().gateway();

    let created = gateway.create_patient(ana()).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.treatments, 0);

    let fetched = gateway.get_patient_by_id(&created.id).await.unwrap();
    assert_eq!(fetched.name, "Ana Ruiz");
    assert_eq!(fetched.cedula, "001");
    assert_eq!(fetched.status, PatientStatus::Activo);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn missing_patient_is_none_or_not_found() {
    let gateway = MemoryBackend::new().gateway();
    assert!(gateway.get_patient_by_id("nobody").await.is_none());

    let err = gateway.try_get_patient_by_id("nobody").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { entity: "Patient", .. }));
}

#[tokio::test]
async fn update_stamps_a_later_updated_at() {
    let (_, gateway, id) = seeded().await;
    let before = gateway.get_patient_by_id(&id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let patch = PatientPatch {
        phone: Some("555-0199".into()),
        ..Default::default()
    };
    let updated = gateway.update_patient(&id, patch).await.unwrap();
    assert_eq!(updated.phone, "555-0199");
    assert_eq!(updated.name, "Ana Ruiz");

    let after = gateway.get_patient_by_id(&id).await.unwrap();
    assert_eq!(after.phone, "555-0199");
    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn update_of_missing_row() {
    let gateway = MemoryBackend::new().gateway();
    assert!(gateway
        .update_patient("ghost", PatientPatch::default())
        .await
        .is_none());
    let err = gateway
        .try_update_appointment("ghost", AppointmentPatch::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_then_get_is_none() {
    let (_, gateway, id) = seeded().await;
    assert!(gateway.delete_patient(&id).await);
    assert!(gateway.get_patient_by_id(&id).await.is_none());
    // a second delete finds nothing
    assert!(!gateway.delete_patient(&id).await);
}

#[tokio::test]
async fn patients_are_listed_newest_first() {
    let gateway = MemoryBackend::new().gateway();
    for name in ["Ana Ruiz", "Luis Gómez", "Marta Díaz"] {
        gateway
            .create_patient(NewPatient::new(name, "x", "y", "z@x.co"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let names: Vec<String> = gateway
        .get_patients()
        .await
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Marta Díaz", "Luis Gómez", "Ana Ruiz"]);
}

#[tokio::test]
async fn appointments_are_ascending_with_patient_name() {
    let (_, gateway, id) = seeded().await;
    for (day, time) in [
        (date!(2024 - 07 - 03), "09:00"),
        (date!(2024 - 07 - 01), "16:30"),
        (date!(2024 - 07 - 02), "10:15"),
        (date!(2024 - 07 - 01), "08:00"),
    ] {
        gateway
            .create_appointment(NewAppointment::new(&id, day, time, 30, "Limpieza"))
            .await
            .unwrap();
    }

    let appointments = gateway.get_appointments(None).await;
    let slots: Vec<(String, &str)> = appointments
        .iter()
        .map(|a| (a.date.to_string(), a.time.as_str()))
        .collect();
    assert_eq!(
        slots,
        vec![
            ("2024-07-01".to_string(), "08:00"),
            ("2024-07-01".to_string(), "16:30"),
            ("2024-07-02".to_string(), "10:15"),
            ("2024-07-03".to_string(), "09:00"),
        ]
    );
    assert!(appointments
        .iter()
        .all(|a| a.patient_name.as_deref() == Some("Ana Ruiz")));
    assert_eq!(appointments[0].status, AppointmentStatus::Pendiente);
}

#[tokio::test]
async fn appointments_filter_by_patient() {
    let (_, gateway, ana_id) = seeded().await;
    let luis = gateway
        .create_patient(NewPatient::new("Luis Gómez", "002", "556", "l@x.co"))
        .await
        .unwrap();
    let day = date!(2024 - 07 - 01);
    gateway
        .create_appointment(NewAppointment::new(&ana_id, day, "09:00", 30, "Control"))
        .await
        .unwrap();
    gateway
        .create_appointment(NewAppointment::new(&luis.id, day, "10:00", 45, "Ortodoncia"))
        .await
        .unwrap();

    let only_luis = gateway.get_appointments(Some(&luis.id)).await;
    assert_eq!(only_luis.len(), 1);
    assert_eq!(only_luis[0].patient_name.as_deref(), Some("Luis Gómez"));
    assert_eq!(only_luis[0].kind, "Ortodoncia");
}

#[tokio::test]
async fn appointments_with_unpadded_times_stay_in_clock_order() {
    let (_, gateway, id) = seeded().await;
    for time in ["10:00", "9:00"] {
        let appointment = NewAppointment::new(&id, date!(2024 - 07 - 01), time, 30, "Control");
        gateway.create_appointment(appointment).await.unwrap();
    }

    let times: Vec<String> = gateway
        .get_appointments(Some(&id))
        .await
        .into_iter()
        .map(|a| a.time)
        .collect();
    assert_eq!(times, vec!["9:00", "10:00"]);
}

#[tokio::test]
async fn appointment_update_and_delete() {
    let (_, gateway, id) = seeded().await;
    let appointment = gateway
        .create_appointment(NewAppointment::new(&id, date!(2024 - 07 - 01), "09:00", 30, "Control"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let patch = AppointmentPatch {
        status: Some(AppointmentStatus::Confirmada),
        ..Default::default()
    };
    let updated = gateway
        .update_appointment(&appointment.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.status, AppointmentStatus::Confirmada);
    assert!(updated.updated_at > appointment.updated_at);
    assert_eq!(updated.created_at, appointment.created_at);

    assert!(gateway.delete_appointment(&appointment.id).await);
    assert!(gateway.get_appointments(Some(&id)).await.is_empty());
}

#[tokio::test]
async fn appointment_for_unknown_patient_is_rejected() {
    let gateway = MemoryBackend::new().gateway();
    let appointment = NewAppointment::new("ghost", date!(2024 - 07 - 01), "09:00", 30, "Control");
    let result = gateway.create_appointment(appointment).await;
    assert!(result.is_none());
}

#[tokio::test]
async fn history_is_newest_first_and_bumps_treatments() {
    let (_, gateway, id) = seeded().await;
    for (day, treatment) in [
        (date!(2024 - 01 - 10), "Limpieza"),
        (date!(2024 - 03 - 05), "Resina"),
        (date!(2024 - 02 - 20), "Extracción"),
    ] {
        let added = gateway
            .try_add_medical_history(NewMedicalHistory::new(&id, day, treatment))
            .await
            .unwrap();
        assert!(added.treatments_synced);
    }

    let treatments: Vec<String> = gateway
        .get_medical_history(&id)
        .await
        .into_iter()
        .map(|h| h.treatment)
        .collect();
    assert_eq!(treatments, vec!["Resina", "Extracción", "Limpieza"]);

    let patient = gateway.get_patient_by_id(&id).await.unwrap();
    assert_eq!(patient.treatments, 3);
}

#[tokio::test]
async fn failed_increment_keeps_history_and_flags_drift() {
    let (backend, gateway, id) = seeded().await;
    backend
        .records
        .fail_on(FailPoint::call(INCREMENT_TREATMENTS_PROCEDURE));

    let entry =
        NewMedicalHistory::new(&id, date!(2024 - 05 - 01), "Control").with_notes("sin dolor");
    let added = gateway.try_add_medical_history(entry).await.unwrap();
    assert!(!added.treatments_synced);
    assert_eq!(added.record.notes.as_deref(), Some("sin dolor"));

    // the sentinel form still returns the row
    let record = gateway
        .add_medical_history(NewMedicalHistory::new(&id, date!(2024 - 05 - 02), "Control"))
        .await;
    assert!(record.is_some());

    assert_eq!(gateway.get_medical_history(&id).await.len(), 2);
    assert_eq!(gateway.get_patient_by_id(&id).await.unwrap().treatments, 0);
}

#[tokio::test]
async fn list_failure_is_an_empty_list() {
    let (backend, gateway, _) = seeded().await;
    backend
        .records
        .fail_on(FailPoint::select(Collection::Patients.as_str()));

    assert!(gateway.get_patients().await.is_empty());
    let err = gateway.try_get_patients().await.unwrap_err();
    assert!(matches!(err, GatewayError::Storage(ref e) if e.is_transport()));
}

#[tokio::test]
async fn upload_stores_blob_and_metadata() {
    let (backend, gateway, id) = seeded().await;

    let upload = FileUpload::new("rx panoramica.png", "image/png", vec![1u8; 2048]);
    let file = gateway.upload_patient_file(&id, upload).await.unwrap();
    assert_eq!(file.name, "rx panoramica.png");
    assert_eq!(file.mime_type, "image/png");
    assert_eq!(file.size, 2048);
    assert!(file.storage_path.starts_with(&format!("{id}/")));
    assert!(file.storage_path.ends_with("-rx panoramica.png"));

    let blob = backend.blobs.get("patient-files", &file.storage_path).unwrap();
    assert_eq!(blob.content.len(), 2048);
    assert_eq!(blob.content_type, "image/png");

    let listed = gateway.get_patient_files(&id).await;
    assert_eq!(listed, vec![file.clone()]);

    let url = gateway.get_file_url(&file.storage_path).await.unwrap();
    assert!(url.ends_with("?expires_in=3600"));
}

#[tokio::test]
async fn patient_files_are_listed_newest_first() {
    let (_, gateway, id) = seeded().await;
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        gateway
            .upload_patient_file(&id, FileUpload::new(name, "application/pdf", vec![1]))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let names: Vec<String> = gateway
        .get_patient_files(&id)
        .await
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["c.pdf", "b.pdf", "a.pdf"]);
}

#[tokio::test]
async fn upload_failure_creates_no_row() {
    let (backend, gateway, id) = seeded().await;
    backend.blobs.fail_on(FailPoint::upload("patient-files"));

    let file = gateway
        .upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![0u8; 10]))
        .await;
    assert!(file.is_none());
    assert!(backend.records.is_empty(Collection::PatientFiles.as_str()));
    assert!(gateway.get_patient_files(&id).await.is_empty());
}

#[tokio::test]
async fn metadata_failure_removes_uploaded_blob() {
    let (backend, gateway, id) = seeded().await;
    backend
        .records
        .fail_on(FailPoint::insert(Collection::PatientFiles.as_str()));

    let err = gateway
        .try_upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![0u8; 10]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Storage(_)));
    assert!(backend.blobs.keys("patient-files").is_empty());
}

#[tokio::test]
async fn upload_for_unknown_patient_compensates() {
    let backend = MemoryBackend::new();
    let gateway = backend.gateway();

    let file = gateway
        .upload_patient_file("ghost", FileUpload::new("a.pdf", "application/pdf", vec![1]))
        .await;
    assert!(file.is_none());
    assert!(backend.blobs.keys("patient-files").is_empty());
}

#[tokio::test]
async fn delete_file_removes_blob_and_row() {
    let (backend, gateway, id) = seeded().await;
    let file = gateway
        .upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![1, 2]))
        .await
        .unwrap();

    let deletion = gateway.try_delete_patient_file(&file.id).await.unwrap();
    assert!(deletion.blob_removed);
    assert_eq!(deletion.file, file);
    assert!(!backend.blobs.contains("patient-files", &file.storage_path));
    assert!(gateway.get_patient_files(&id).await.is_empty());
}

#[tokio::test]
async fn delete_file_with_storage_failure_orphans_the_blob() {
    let (backend, gateway, id) = seeded().await;
    let file = gateway
        .upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![1, 2]))
        .await
        .unwrap();
    backend.blobs.fail_on(FailPoint::remove("patient-files"));

    assert!(gateway.delete_patient_file(&file.id).await);
    assert!(gateway.get_patient_files(&id).await.is_empty());
    assert!(backend.blobs.contains("patient-files", &file.storage_path));
}

#[tokio::test]
async fn delete_file_reports_orphan_in_result_form() {
    let (backend, gateway, id) = seeded().await;
    let file = gateway
        .upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![1]))
        .await
        .unwrap();
    backend.blobs.fail_on(FailPoint::remove("patient-files"));

    let deletion = gateway.try_delete_patient_file(&file.id).await.unwrap();
    assert!(!deletion.blob_removed);
}

#[tokio::test]
async fn delete_file_fails_when_row_cannot_be_read_or_deleted() {
    let (backend, gateway, id) = seeded().await;
    assert!(!gateway.delete_patient_file("missing").await);

    let file = gateway
        .upload_patient_file(&id, FileUpload::new("a.pdf", "application/pdf", vec![1]))
        .await
        .unwrap();
    backend
        .records
        .fail_on(FailPoint::delete(Collection::PatientFiles.as_str()));
    assert!(!gateway.delete_patient_file(&file.id).await);
}

#[tokio::test]
async fn signed_url_for_missing_object_is_none() {
    let gateway = MemoryBackend::new().gateway();
    assert!(gateway.get_file_url("p1/1-missing.pdf").await.is_none());
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let gateway = MemoryBackend::new().gateway();

    let mut handles = Vec::new();
    for i in 0..20 {
        let gateway = gateway.clone();
        handles.push(tokio::spawn(async move {
            let patient =
                NewPatient::new(format!("Paciente {i}"), format!("{i:03}"), "555", "p@x.co");
            gateway.create_patient(patient).await
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let patient = handle.await.unwrap().unwrap();
        assert!(ids.insert(patient.id));
    }
    assert_eq!(gateway.get_patients().await.len(), 20);
}
