//! Integration tests for the HTTP detector client against a mock vision
//! service.

use std::path::PathBuf;
use std::time::Duration;

use fieldwatch_inference::{
    Category, DetectionClient, DetectionResult, DetectorConfig, Error, HttpDetectionClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn frame(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let file = dir.path().join(name);
    std::fs::write(&file, b"\xFF\xD8\xFFfake-jpeg").unwrap();
    file
}

fn client_for(server: &MockServer, timeout: Duration) -> HttpDetectionClient {
    HttpDetectionClient::new(
        DetectorConfig::default()
            .with_base_url(server.uri())
            .with_timeout(timeout),
    )
}

#[tokio::test]
async fn test_wildlife_submission_returns_labels() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-animals"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "objects": ["Noru", "person"] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "2.jpg");
    let client = client_for(&mock_server, Duration::from_secs(5));

    let result = client
        .submit(Category::Wildlife, "wildlife_2", &file)
        .await
        .expect("detection should succeed");
    assert_eq!(
        result,
        DetectionResult::Wildlife {
            labels: vec!["Noru".to_string(), "person".to_string()]
        }
    );

    let requests = mock_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"2.jpg\""));
    assert!(body.contains("name=\"job_id\""));
    assert!(body.contains("wildlife_2"));
    assert!(body.contains("image/jpeg"));
}

#[tokio::test]
async fn test_intrusion_submission_returns_owner_flag() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-face"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "isOwner": false })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "1.jpg");
    let client = client_for(&mock_server, Duration::from_secs(5));

    let result = client
        .submit(Category::Intrusion, "intrusion_1", &file)
        .await
        .unwrap();
    assert_eq!(
        result,
        DetectionResult::Intrusion {
            is_owner: Some(false)
        }
    );
}

#[tokio::test]
async fn test_service_unavailable_maps_to_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-animals"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "1.jpg");
    let client = client_for(&mock_server, Duration::from_secs(5));

    let err = client
        .submit(Category::Wildlife, "wildlife_1", &file)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DetectorUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_server_error_maps_to_detector_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-face"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "4.jpg");
    let client = client_for(&mock_server, Duration::from_secs(5));

    let err = client
        .submit(Category::Intrusion, "intrusion_4", &file)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Detector(ref msg) if msg.contains("model crashed")));
}

#[tokio::test]
async fn test_slow_detector_times_out_as_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-animals"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "objects": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "5.jpg");
    let client = client_for(&mock_server, Duration::from_millis(200));

    let err = client
        .submit(Category::Wildlife, "wildlife_5", &file)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DetectorUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_detector_is_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let file = frame(&tmp, "1.jpg");
    // Port 9 (discard) is closed on test hosts.
    let client = HttpDetectionClient::new(
        DetectorConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2)),
    );

    let err = client
        .submit(Category::Wildlife, "wildlife_1", &file)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DetectorUnavailable(_)), "got {:?}", err);
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_missing_file_is_detector_error() {
    let mock_server = MockServer::start().await;
    let client = client_for(&mock_server, Duration::from_secs(5));

    let err = client
        .submit(
            Category::Wildlife,
            "wildlife_7",
            std::path::Path::new("/nonexistent/7.jpg"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Detector(_)));
}

#[tokio::test]
async fn test_annotated_image_fetch_and_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/image-result/wildlife_2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/image-result/wildlife_9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "Image not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_secs(5));
    assert_eq!(
        client.annotated_image("wildlife_2").await.unwrap(),
        vec![0xFF, 0xD8, 0xFF]
    );
    assert!(matches!(
        client.annotated_image("wildlife_9").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_health_check_reachable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Duration::from_secs(5));
    assert!(client.health_check().await.unwrap());
}
