//! End-to-end workflow tests against mock storage and converter services.
//!
//! Each test starts its own `wiremock` servers, so nothing here touches the
//! network or the real environment.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xeoservices::{
    check_health_to_log, check_process, check_process_to_log, check_services_health,
    convert_ifc_to_xkt, convert_ifc_to_xkt_to_log, create_clients, get_file_entry,
    get_process_status, upload_file, ErrorKind, Service, ServiceClient, ServiceClients,
    ServicesConfig, WorkflowProgress, WorkflowStep, XeoError,
};

const TOKEN: &str = "test-token";
const BEARER: &str = "Bearer test-token";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn clients_for(storage: &MockServer, converter: &MockServer, logs: &Path) -> ServiceClients {
    let config = ServicesConfig::builder()
        .access_token(TOKEN)
        .storage_url(storage.uri())
        .converter_url(converter.uri())
        .logs_dir(logs)
        .build()
        .unwrap();
    create_clients(&config).unwrap()
}

fn write_model(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, bytes).unwrap();
    p
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Mount the four calls of a successful `convert-ifc-xkt` run.
async fn mount_happy_convert(storage: &MockServer, converter: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/file"))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
        })))
        .expect(1)
        .mount(storage)
        .await;
    Mock::given(method("PUT"))
        .and(path("/up/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/f1"))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "f1",
            "downloadUrl": "https://dl/1"
        })))
        .expect(1)
        .mount(storage)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .and(header("authorization", BEARER))
        .and(body_json(json!({"downloadUrl": "https://dl/1", "type": "ifc-xkt"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(converter)
        .await;
}

/// Records every progress event as `"<kind>:<step>"`.
#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl WorkflowProgress for RecordingProgress {
    fn on_step_start(&self, step: WorkflowStep) {
        self.events.lock().unwrap().push(format!("start:{step}"));
    }
    fn on_step_complete(&self, step: WorkflowStep) {
        self.events.lock().unwrap().push(format!("done:{step}"));
    }
    fn on_step_error(&self, step: WorkflowStep, _error: &str) {
        self.events.lock().unwrap().push(format!("error:{step}"));
    }
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_posts_then_puts_bytes_without_bearer() {
    let storage = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"ISO-10303-21;");

    let link = json!({
        "id": "f1",
        "parts": [{"uploadUrl": format!("{}/up/1", storage.uri()), "partNumber": 1}],
        "bucket": "models"
    });
    Mock::given(method("POST"))
        .and(path("/file"))
        .and(header("authorization", BEARER))
        .and(body_json(json!({"name": "model.ifc", "parts": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(link.clone()))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .and(path("/up/1"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&storage)
        .await;

    let clients = clients_for(&storage, &storage, tmp.path());
    let target = upload_file(&clients.storage, &model).await.unwrap();

    // Unknown fields survive the round trip.
    assert_eq!(serde_json::to_value(&target).unwrap(), link);

    let requests = storage.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method.as_str(), "POST");
    assert_eq!(requests[1].method.as_str(), "PUT");
    assert_eq!(requests[1].body, b"ISO-10303-21;");
    assert!(
        requests[1].headers.get("authorization").is_none(),
        "pre-signed PUT must not carry the bearer token"
    );
}

#[tokio::test]
async fn upload_link_failure_skips_put() {
    let storage = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&storage)
        .await;

    let clients = clients_for(&storage, &storage, tmp.path());
    let err = upload_file(&clients.storage, &model).await.unwrap_err();

    assert!(matches!(err, XeoError::UploadLinkFailed(_)), "got {err:?}");
    assert_eq!(err.http_failure().and_then(|f| f.status), Some(401));
    assert!(err.to_string().contains("bad token"));
}

#[tokio::test]
async fn rejected_put_is_upload_failure() {
    let storage = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
        })))
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .and(path("/up/1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&storage)
        .await;

    let clients = clients_for(&storage, &storage, tmp.path());
    let err = upload_file(&clients.storage, &model).await.unwrap_err();

    assert!(matches!(err, XeoError::UploadFailed(_)), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn upload_link_without_parts_is_invalid_response() {
    let storage = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "f1", "parts": []})))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&storage)
        .await;

    let clients = clients_for(&storage, &storage, tmp.path());
    let err = upload_file(&clients.storage, &model).await.unwrap_err();

    assert!(matches!(err, XeoError::InvalidResponse { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

// ── Metadata ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_json_body_is_invalid_response() {
    let storage = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file/f1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("{\"id\": \"f1\", "),
        )
        .expect(1)
        .mount(&storage)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &storage, tmp.path());

    let err = get_file_entry(&clients.storage, "f1").await.unwrap_err();

    match &err {
        XeoError::InvalidResponse { operation, .. } => assert_eq!(*operation, "fetch file entry"),
        other => panic!("expected InvalidResponse, got {other:?}"),
    }
    assert!(err.http_failure().is_none());
}

// ── Convert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_conversion_is_start_failure() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
        })))
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/f1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "f1", "downloadUrl": "https://dl/1"})),
        )
        .mount(&storage)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unsupported type"))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");
    let logs = tmp.path().join("logs");
    let clients = clients_for(&storage, &converter, &logs);

    let err = convert_ifc_to_xkt_to_log(&clients, model.to_str().unwrap(), &logs)
        .await
        .unwrap_err();

    assert!(matches!(err, XeoError::ConversionStartFailed(_)), "got {err:?}");
    assert_eq!(err.http_failure().and_then(|f| f.status), Some(400));
    assert!(err.to_string().contains("unsupported type"));
    assert!(!logs.exists());
}

#[tokio::test]
async fn convert_writes_combined_log() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    mount_happy_convert(&storage, &converter).await;

    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"ISO-10303-21;");
    let logs = tmp.path().join("logs");
    let clients = clients_for(&storage, &converter, &logs);

    let written = convert_ifc_to_xkt_to_log(&clients, model.to_str().unwrap(), &logs)
        .await
        .unwrap();

    assert_eq!(written.path, logs.join("model.ifc-convert-request.log.json"));
    let mut log = read_json(&written.path);
    assert_eq!(serde_json::to_value(&written.record).unwrap(), log);
    let timestamp = log
        .as_object_mut()
        .unwrap()
        .remove("timestamp")
        .expect("timestamp present");
    assert!(timestamp.as_str().unwrap().ends_with('Z'));
    assert_eq!(
        log,
        json!({
            "fileUpload": {
                "id": "f1",
                "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
            },
            "fileEntry": {"id": "f1", "downloadUrl": "https://dl/1"},
            "procesEntry": {"id": "p1"}
        })
    );
}

#[tokio::test]
async fn metadata_failure_never_starts_conversion() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
        })))
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .and(path("/up/1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/f1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "p1"})))
        .expect(0)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");
    let logs = tmp.path().join("logs");
    let clients = clients_for(&storage, &converter, &logs);

    let err = convert_ifc_to_xkt_to_log(&clients, model.to_str().unwrap(), &logs)
        .await
        .unwrap_err();

    match &err {
        XeoError::MetadataFetchFailed { file_id, failure } => {
            assert_eq!(file_id, "f1");
            assert_eq!(failure.status, Some(404));
        }
        other => panic!("expected MetadataFetchFailed, got {other:?}"),
    }
    assert!(!logs.exists(), "no log is written for a failed run");
}

#[tokio::test]
async fn missing_input_makes_no_requests() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &converter, tmp.path());

    let err = convert_ifc_to_xkt(&clients, tmp.path().join("absent.ifc"))
        .await
        .unwrap_err();

    assert!(matches!(err, XeoError::FileNotFound { .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(storage.received_requests().await.unwrap().is_empty());
    assert!(converter.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn conversion_type_comes_from_config() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "parts": [{"uploadUrl": format!("{}/up/1", storage.uri())}]
        })))
        .mount(&storage)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/f1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "f1", "downloadUrl": "https://dl/1"})),
        )
        .mount(&storage)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .and(body_json(json!({"downloadUrl": "https://dl/1", "type": "ifc-glb"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p2",
            "type": "ifc-glb",
            "status": "queued"
        })))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");
    let config = ServicesConfig::builder()
        .access_token(TOKEN)
        .storage_url(storage.uri())
        .converter_url(converter.uri())
        .conversion_type("ifc-glb")
        .logs_dir(tmp.path())
        .build()
        .unwrap();
    let clients = create_clients(&config).unwrap();

    let record = convert_ifc_to_xkt(&clients, &model).await.unwrap();

    assert_eq!(record.payload.process_entry.id, "p2");
    assert_eq!(record.payload.process_entry.kind.as_deref(), Some("ifc-glb"));
    assert_eq!(record.payload.process_entry.extra["status"], "queued");
}

#[tokio::test]
async fn progress_reports_each_step_in_order() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    mount_happy_convert(&storage, &converter).await;

    let tmp = tempfile::tempdir().unwrap();
    let model = write_model(tmp.path(), "model.ifc", b"x");
    let recorder = Arc::new(RecordingProgress::default());
    let config = ServicesConfig::builder()
        .access_token(TOKEN)
        .storage_url(storage.uri())
        .converter_url(converter.uri())
        .logs_dir(tmp.path())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let clients = create_clients(&config).unwrap();

    convert_ifc_to_xkt_to_log(&clients, model.to_str().unwrap(), tmp.path())
        .await
        .unwrap();

    let expected: Vec<String> = [
        WorkflowStep::CreateUploadLink,
        WorkflowStep::UploadFile,
        WorkflowStep::FetchFileEntry,
        WorkflowStep::StartConversion,
        WorkflowStep::WriteLog,
    ]
    .iter()
    .flat_map(|s| [format!("start:{s}"), format!("done:{s}")])
    .collect();
    assert_eq!(*recorder.events.lock().unwrap(), expected);
}

// ── Process status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn check_process_writes_status_log() {
    let converter = MockServer::start().await;
    let body = json!({"id": "p1", "status": "done", "output": {"xkt": "https://dl/p1.xkt"}});
    Mock::given(method("GET"))
        .and(path("/process/p1"))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&converter, &converter, tmp.path());

    let written = check_process_to_log(&clients, "p1", tmp.path()).await.unwrap();
    let log_path = written.path;

    assert_eq!(written.record.payload.process_response.id, "p1");
    assert_eq!(log_path, tmp.path().join("p1-process-status.log.json"));
    let log = read_json(&log_path);
    assert_eq!(log["processResponse"], body);
    assert!(log["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_process_is_status_failure() {
    let converter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/process/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&converter, &converter, tmp.path());

    let err = check_process(&clients, "nope").await.unwrap_err();

    assert!(
        matches!(err, XeoError::StatusFetchFailed { ref process_id, .. } if process_id == "nope"),
        "got {err:?}"
    );
    assert!(err.to_string().contains("HTTP 404"));
}

#[tokio::test]
async fn unreachable_service_is_transport_failure() {
    // Nothing listens on port 1.
    let converter = ServiceClient::new(
        Service::Converter,
        "http://127.0.0.1:1",
        TOKEN,
        reqwest::Client::new(),
    )
    .unwrap();

    let err = get_process_status(&converter, "p1").await.unwrap_err();

    let failure = match &err {
        XeoError::StatusFetchFailed { failure, .. } => failure,
        other => panic!("expected StatusFetchFailed, got {other:?}"),
    };
    assert_eq!(failure.status, None);
    assert!(!failure.detail.is_empty());
    assert!(err.to_string().contains("request failed"));
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_combines_both_bodies() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "db": "up"})))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &converter, tmp.path());

    let before = chrono::Utc::now();
    let report = check_services_health(&clients).await.unwrap();
    let after = chrono::Utc::now();

    assert!(before <= report.timestamp && report.timestamp <= after);
    assert_eq!(report.converter_status, json!({"status": "ok"}));
    assert_eq!(report.storage_status, json!({"status": "ok", "db": "up"}));
}

#[tokio::test]
async fn failing_converter_skips_storage() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(0)
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &converter, tmp.path());

    let err = check_health_to_log(&clients, tmp.path()).await.unwrap_err();

    assert!(err.to_string().contains("converter"), "got {err}");
    assert_eq!(err.http_failure().and_then(|f| f.status), Some(500));
    assert!(!tmp.path().join("health.log.json").exists());
}

#[tokio::test]
async fn failing_storage_is_named_after_healthy_converter() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .expect(1)
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &converter, tmp.path());

    let err = check_health_to_log(&clients, tmp.path()).await.unwrap_err();

    assert!(
        matches!(err, XeoError::HealthCheckFailed { service: Service::Storage, .. }),
        "got {err:?}"
    );
    assert!(err.to_string().starts_with("storage health check failed"), "got {err}");
    assert!(!tmp.path().join("health.log.json").exists());
}

#[tokio::test]
async fn health_log_uses_service_keys() {
    let storage = MockServer::start().await;
    let converter = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"s": 1})))
        .mount(&storage)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&converter)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let clients = clients_for(&storage, &converter, tmp.path());

    let log_path = check_health_to_log(&clients, tmp.path()).await.unwrap().path;

    assert_eq!(log_path, tmp.path().join("health.log.json"));
    let log = read_json(&log_path);
    assert_eq!(log["storageStatus"], json!({"s": 1}));
    // Empty 200 body is recorded as an empty object.
    assert_eq!(log["converterStatus"], json!({}));
    assert!(log["timestamp"].is_string());
}
