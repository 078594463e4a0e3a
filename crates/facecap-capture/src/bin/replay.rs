//! Replay recorded face detections through the capture pipeline.
//!
//! Usage: `facecap-replay <detections.jsonl> <still.jpg>`
//!
//! Each line of the detections file is one analyzed frame:
//! `{"frame": {"width": 1280, "height": 720}, "faces": [{"x": .., "y": .., "width": .., "height": ..}]}`.
//! Captures copy the still image, crop it to the selected face and post it to
//! `SINK_URL`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use facecap_capture::{
    CaptureConfig, CaptureOutcome, CapturePipeline, FrameAnalyzer, LoggingObserver, StillImageCamera,
};
use facecap_media::JpegEngine;
use facecap_models::{FrameDimensions, FrameRect, PreviewDimensions};
use facecap_sink::SinkClient;

#[derive(Debug, Deserialize)]
struct FrameSize {
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct DetectionLine {
    #[serde(default)]
    frame: Option<FrameSize>,
    #[serde(default)]
    faces: Vec<FrameRect>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("facecap=info,info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(detections), Some(still)) = (args.next(), args.next()) else {
        bail!("usage: facecap-replay <detections.jsonl> <still.jpg>");
    };

    info!("Starting facecap-replay");

    let config = CaptureConfig::from_env();
    info!("Capture config: {:?}", config);

    let sink = SinkClient::from_env().context("failed to create sink client")?;
    info!("Submitting captures to {}", sink.url());
    let engine = JpegEngine::new(config.jpeg_quality)?;

    let work_dir = tempfile::TempDir::new().context("failed to create work directory")?;
    let camera = StillImageCamera::new(&still, work_dir.path());

    let pipeline = CapturePipeline::builder()
        .camera(Arc::new(camera))
        .engine(Arc::new(engine))
        .sink(Arc::new(sink))
        .observer(Arc::new(LoggingObserver))
        .config(config)
        .build()?;
    let analyzer = FrameAnalyzer::new(pipeline);

    let preview = PreviewDimensions::new(env_or("PREVIEW_WIDTH", 393.0), env_or("PREVIEW_HEIGHT", 873.0))?;
    analyzer.on_preview_layout(preview);

    let interval = Duration::from_millis(env_or("REPLAY_FRAME_INTERVAL_MS", 33));
    let contents = tokio::fs::read_to_string(&detections)
        .await
        .with_context(|| format!("failed to read {}", detections))?;

    let mut frames = 0usize;
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: DetectionLine = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                continue;
            }
        };
        let frame = record
            .frame
            .and_then(|size| FrameDimensions::new(size.width, size.height).ok());

        let decision = analyzer.on_frame(&record.faces, frame);
        debug!(
            line = index + 1,
            faces = analyzer.last_face_count(),
            "Frame decision: {:?}",
            decision
        );

        frames += 1;
        tokio::time::sleep(interval).await;
    }

    info!("Replayed {} frames", frames);

    match analyzer.settle().await {
        Some(CaptureOutcome::Succeeded { response, .. }) => {
            info!("Capture accepted: {}", response.as_json());
            Ok(())
        }
        Some(CaptureOutcome::Failed(e)) => {
            error!("Last capture failed: {}", e);
            Err(e.into())
        }
        Some(CaptureOutcome::Skipped(reason)) => {
            warn!("Last capture skipped: {}", reason.as_str());
            Ok(())
        }
        None => {
            warn!("No capture was triggered");
            Ok(())
        }
    }
}
