//! HTTP-level tests for the Veo client and the Cloud Storage store,
//! run against a local mock server.

use std::path::Path;
use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use showreel_core::config::GenerationConfig;
use showreel_core::error::CoreError;
use showreel_core::job::{JobHandle, JobState};
use showreel_core::prompt::GenerationRequest;
use showreel_core::scenario::Scenario;
use showreel_core::subject::SubjectKind;
use showreel_veo::api::VeoApi;
use showreel_veo::auth::StaticToken;
use showreel_veo::messages::OperationStatus;
use showreel_veo::service::{VeoClient, VideoService};
use showreel_veo::storage::{GcsObjectStore, ObjectStore};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
const MODELS_PATH: &str = "/v1/projects/demo/locations/us-central1/publishers/google/models";
const OPERATION: &str =
    "projects/demo/locations/us-central1/publishers/google/models/veo-3.0-generate-001/operations/42";

fn client(server: &MockServer) -> VeoClient {
    let api = VeoApi::with_client(
        reqwest::Client::new(),
        &format!("{}/v1", server.uri()),
        "demo",
        "us-central1",
    );
    VeoClient::new(
        api,
        Arc::new(StaticToken::new("test-token")),
        "veo-3.0-generate-001",
    )
}

fn request(path: &str, bytes: &[u8]) -> GenerationRequest {
    GenerationRequest::compose(
        Path::new(path),
        bytes,
        Scenario::custom("Slow dolly towards the table"),
        SubjectKind::Table,
        &GenerationConfig::default(),
    )
}

#[tokio::test]
async fn submit_returns_pending_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{MODELS_PATH}/veo-3.0-generate-001:predictLongRunning"
        )))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "parameters": { "durationSeconds": 8, "aspectRatio": "16:9" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(1)
        .mount(&server)
        .await;

    let job = client(&server)
        .submit(&request("table.png", PNG_MAGIC))
        .await
        .unwrap();

    assert_eq!(job.handle().as_str(), OPERATION);
    assert_eq!(job.state(), JobState::Pending);
}

#[tokio::test]
async fn unsupported_media_type_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&request("table.gif", b"GIF89a...."))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn rejected_credentials_are_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&request("table.png", PNG_MAGIC))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Auth(_));
}

#[tokio::test]
async fn server_errors_are_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&request("table.png", PNG_MAGIC))
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn poll_uses_model_from_operation_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{MODELS_PATH}/veo-3.0-generate-001:fetchPredictOperation"
        )))
        .and(body_partial_json(json!({ "operationName": OPERATION })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": { "videos": [ { "gcsUri": "gs://bucket/out/sample_0.mp4", "mimeType": "video/mp4" } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client(&server)
        .poll(&JobHandle::new(OPERATION))
        .await
        .unwrap();

    assert_matches!(status, OperationStatus::Succeeded(artifacts) if artifacts.len() == 1);
}

#[tokio::test]
async fn gcs_copy_writes_object_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/bucket/o/out%2Fsample_0.mp4"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let store = GcsObjectStore::with_client(
        reqwest::Client::new(),
        &server.uri(),
        Arc::new(StaticToken::new("test-token")),
    );
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("clip.mp4");

    store
        .copy("gs://bucket/out/sample_0.mp4", &target)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), b"video-bytes");
}

#[tokio::test]
async fn gcs_missing_object_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = GcsObjectStore::with_client(
        reqwest::Client::new(),
        &server.uri(),
        Arc::new(StaticToken::new("test-token")),
    );
    let dir = tempfile::tempdir().unwrap();

    let err = store
        .copy("gs://bucket/missing.mp4", &dir.path().join("x.mp4"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Transport(_));
}
