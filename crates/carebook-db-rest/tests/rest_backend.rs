//! Request shapes and error mapping of the REST backend against a mock server.

use std::time::Duration;

use carebook_db_rest::{BlobStore, RecordStore, RestBackend, StorageError};
use carebook_storage::{Embed, Query};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> RestBackend {
    RestBackend::new(&server.uri(), "anon-key", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn select_sends_filters_order_and_embed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "*,patients(name)"))
        .and(query_param("patient_id", "eq.p1"))
        .and(query_param("order", "date.asc,time.asc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a1", "date": "2024-07-01", "patients": {"name": "Ana Ruiz"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::new("appointments")
        .filter_eq("patient_id", "p1")
        .order_asc("date")
        .order_asc("time")
        .with_embed(Embed::new("patients", "patient_id", ["name"]));
    let rows = backend(&server).select(&query).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["patients"]["name"], "Ana Ruiz");
}

#[tokio::test]
async fn select_by_id_returns_none_for_empty_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let row = backend(&server)
        .select_by_id("patients", "missing")
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn insert_asks_for_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"name": "Ana Ruiz", "cedula": "8-123-456"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "p1", "name": "Ana Ruiz", "cedula": "8-123-456", "treatments": 0}
        ])))
        .mount(&server)
        .await;

    let row = backend(&server)
        .insert("patients", &json!({"name": "Ana Ruiz", "cedula": "8-123-456"}))
        .await
        .unwrap();
    assert_eq!(row["id"], "p1");
    assert_eq!(row["treatments"], 0);
}

#[tokio::test]
async fn update_and_delete_target_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.p1"))
        .and(body_json(json!({"phone": "555-0101"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "phone": "555-0101"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let updated = backend
        .update("patients", "p1", &json!({"phone": "555-0101"}))
        .await
        .unwrap();
    assert_eq!(updated.unwrap()["phone"], "555-0101");

    let deleted = backend.delete("patients", "p2").await.unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn call_posts_named_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_patient_treatments"))
        .and(body_json(json!({"patient_id": "p1"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend(&server)
        .call("increment_patient_treatments", &json!({"patient_id": "p1"}))
        .await
        .unwrap();
    assert!(result.is_null());
}

#[tokio::test]
async fn constraint_codes_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "insert or update on table \"appointments\" violates foreign key constraint"
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .insert("appointments", &json!({"patient_id": "ghost"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint { .. }));
}

#[tokio::test]
async fn server_errors_and_auth_failures_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_history"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})),
        )
        .mount(&server)
        .await;

    let backend = backend(&server);
    let err = backend.select(&Query::new("patients")).await.unwrap_err();
    assert!(matches!(err, StorageError::Backend { status: 503, .. }));

    let err = backend.select(&Query::new("medical_history")).await.unwrap_err();
    assert!(matches!(err, StorageError::PermissionDenied { .. }));
    assert_eq!(err.to_string(), "Permission denied: Invalid API key");
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend = RestBackend::new(&server.uri(), "anon-key", Duration::from_millis(50)).unwrap();
    let err = backend.select(&Query::new("patients")).await.unwrap_err();
    assert!(matches!(err, StorageError::Timeout { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let backend =
        RestBackend::new("http://127.0.0.1:1", "anon-key", Duration::from_secs(2)).unwrap();
    let err = backend.select(&Query::new("patients")).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn upload_posts_raw_bytes_under_the_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/patient-files/p1/1709287200250-rx%20panoramica.png"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"Key": "patient-files/p1/1709287200250-rx panoramica.png"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .upload(
            "patient-files",
            "p1/1709287200250-rx panoramica.png",
            vec![0x89, 0x50, 0x4e, 0x47],
            "image/png",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_upload_is_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/patient-files/p1/1-a.pdf"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .upload("patient-files", "p1/1-a.pdf", vec![1], "application/pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }));
}

#[tokio::test]
async fn remove_sends_prefixes_and_reports_names() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/patient-files"))
        .and(body_json(json!({"prefixes": ["p1/1-a.pdf", "p1/2-b.pdf"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "p1/1-a.pdf", "bucket_id": "patient-files"}
        ])))
        .mount(&server)
        .await;

    let removed = backend(&server)
        .remove(
            "patient-files",
            &["p1/1-a.pdf".to_string(), "p1/2-b.pdf".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(removed, vec!["p1/1-a.pdf".to_string()]);
}

#[tokio::test]
async fn signed_url_is_absolute() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/sign/patient-files/p1/1-a.pdf"))
        .and(body_json(json!({"expiresIn": 3600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedURL": "/object/sign/patient-files/p1/1-a.pdf?token=abc"
        })))
        .mount(&server)
        .await;

    let url = backend(&server)
        .signed_url("patient-files", "p1/1-a.pdf", Duration::from_secs(3600))
        .await
        .unwrap();
    assert_eq!(
        url,
        format!("{}/storage/v1/object/sign/patient-files/p1/1-a.pdf?token=abc", server.uri())
    );
}
