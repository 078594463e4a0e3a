//! End-to-end capture flow against a mock ingestion endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{GenericImageView, ImageBuffer, Rgb};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use facecap_capture::{CaptureOutcome, CapturePipeline, CaptureRequest, StillImageCamera};
use facecap_media::JpegEngine;
use facecap_models::{PreviewDimensions, PreviewRect};
use facecap_sink::{SinkClient, SinkConfig};

fn write_still(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("still.jpg");
    let img = ImageBuffer::from_fn(300, 400, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 64u8]));
    img.save(&path).unwrap();
    path
}

async fn mock_sink(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save-base64"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn pipeline_for(server: &MockServer, still: &PathBuf, work_dir: &TempDir) -> CapturePipeline {
    let sink = SinkClient::new(SinkConfig {
        url: format!("{}/save-base64", server.uri()),
        timeout: None,
    })
    .unwrap();

    CapturePipeline::builder()
        .camera(Arc::new(StillImageCamera::new(still, work_dir.path())))
        .engine(Arc::new(JpegEngine::default()))
        .sink(Arc::new(sink))
        .build()
        .unwrap()
}

fn work_dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_face_crop_is_posted_and_photo_removed() {
    let assets = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let still = write_still(&assets);
    let server = mock_sink(200).await;
    let pipeline = pipeline_for(&server, &still, &work_dir);

    let request = CaptureRequest::face(
        PreviewRect::new(100.0, 100.0, 100.0, 200.0),
        PreviewDimensions::new(393.0, 873.0).unwrap(),
    );
    let outcome = pipeline.capture(request).await;

    let payload = match outcome {
        CaptureOutcome::Succeeded { payload, response } => {
            assert_eq!(response.as_json()["id"], "abc");
            payload
        }
        other => panic!("unexpected outcome: {other:?}"),
    };

    let cropped = image::load_from_memory(&STANDARD.decode(&payload.image).unwrap()).unwrap();
    assert_eq!(cropped.dimensions(), (107, 147));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["image"], payload.image.as_str());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    assert!(work_dir_is_empty(&work_dir));
    assert!(still.exists());
    assert!(pipeline.session().is_completed());
}

#[tokio::test]
async fn test_full_frame_posts_raw_photo() {
    let assets = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let still = write_still(&assets);
    let server = mock_sink(200).await;
    let pipeline = pipeline_for(&server, &still, &work_dir);

    let outcome = pipeline.capture(CaptureRequest::full_frame()).await;

    match outcome {
        CaptureOutcome::Succeeded { payload, .. } => {
            assert_eq!(STANDARD.decode(&payload.image).unwrap(), std::fs::read(&still).unwrap());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(work_dir_is_empty(&work_dir));
}

#[tokio::test]
async fn test_rejected_submission_still_removes_photo() {
    let assets = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let still = write_still(&assets);
    let server = mock_sink(500).await;
    let pipeline = pipeline_for(&server, &still, &work_dir);

    let outcome = pipeline.capture(CaptureRequest::full_frame()).await;

    assert!(matches!(outcome, CaptureOutcome::Failed(_)));
    assert!(work_dir_is_empty(&work_dir));
    assert!(!pipeline.session().is_completed());
    assert!(!pipeline.is_capturing());
}
