//! Throttled, single-flight capture pipeline.
//!
//! One attempt runs `Idle → Capturing → (Cropping | Encoding) → Submitting →
//! Idle`. Any failure passes through `Errored` before returning to `Idle`.
//! The in-flight flag is claimed synchronously when an attempt is accepted,
//! before the first suspension point, and released when the attempt's guard
//! drops. An attempt dropped midway still reports an error, has its photo
//! deleted and returns the phase to `Idle`.

use std::future::Future;
use std::sync::Arc;

use facecap_media::{CropPlanner, ImageEngine, JpegEngine, PhotoHandle};
use facecap_models::{CapturePayload, CapturePhase, PreviewDimensions, PreviewRect};
use facecap_sink::{PayloadSink, SinkResponse};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use crate::camera::{Camera, PhotoOptions};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureErrorKind, CaptureResult};
use crate::logging::CaptureLogger;
use crate::metrics;
use crate::session::{CaptureGuard, CaptureSession, SkipReason};

/// Caller-visible capture events.
///
/// For every accepted attempt `on_capture_start` fires first, followed by
/// exactly one of `on_capture_success` or `on_capture_error`. Rejected
/// attempts fire nothing.
pub trait CaptureObserver: Send + Sync {
    fn on_capture_start(&self) {}

    /// Called with the base64 payload after the sink accepted it.
    fn on_capture_success(&self, _image: &str) {}

    fn on_capture_error(&self, _error: &CaptureError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CaptureObserver for NoopObserver {}

/// Input of one capture attempt.
///
/// With both face bounds and the preview size present the photo is cropped
/// to the face. Otherwise the whole photo is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaptureRequest {
    pub bounds: Option<PreviewRect>,
    pub preview: Option<PreviewDimensions>,
}

impl CaptureRequest {
    /// Send the full photo without cropping.
    pub fn full_frame() -> Self {
        Self::default()
    }

    /// Crop to a face measured against the given preview.
    pub fn face(bounds: PreviewRect, preview: PreviewDimensions) -> Self {
        Self {
            bounds: Some(bounds),
            preview: Some(preview),
        }
    }

    fn face_region(&self) -> Option<(PreviewRect, PreviewDimensions)> {
        match (self.bounds, self.preview) {
            (Some(bounds), Some(preview)) => Some((bounds, preview)),
            _ => None,
        }
    }
}

/// Result of a call to [`CapturePipeline::capture`].
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The attempt was rejected by the guard. No state changed.
    Skipped(SkipReason),
    /// The payload was accepted by the sink.
    Succeeded {
        payload: CapturePayload,
        response: SinkResponse,
    },
    /// The attempt failed after it was accepted.
    Failed(CaptureError),
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptureOutcome::Succeeded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaptureOutcome::Skipped(_))
    }

    fn label(&self) -> &'static str {
        match self {
            CaptureOutcome::Skipped(_) => "skipped",
            CaptureOutcome::Succeeded { .. } => "success",
            CaptureOutcome::Failed(_) => "error",
        }
    }
}

struct Inner {
    camera: Arc<dyn Camera>,
    engine: Arc<dyn ImageEngine>,
    sink: Arc<dyn PayloadSink>,
    observer: Arc<dyn CaptureObserver>,
    planner: CropPlanner,
    config: CaptureConfig,
    session: CaptureSession,
    phase: watch::Sender<CapturePhase>,
    runtime: Handle,
}

/// Capture pipeline handle. Clones share the same session.
#[derive(Clone)]
pub struct CapturePipeline {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session.snapshot())
            .field("phase", &*self.inner.phase.borrow())
            .finish()
    }
}

/// Builder for [`CapturePipeline`].
#[derive(Default)]
pub struct CapturePipelineBuilder {
    camera: Option<Arc<dyn Camera>>,
    engine: Option<Arc<dyn ImageEngine>>,
    sink: Option<Arc<dyn PayloadSink>>,
    observer: Option<Arc<dyn CaptureObserver>>,
    config: CaptureConfig,
    session: Option<CaptureSession>,
    runtime: Option<Handle>,
}

impl CapturePipelineBuilder {
    pub fn camera(mut self, camera: Arc<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Image engine. Defaults to a [`JpegEngine`] at the configured quality.
    pub fn engine(mut self, engine: Arc<dyn ImageEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn PayloadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing session, e.g. to survive a pipeline rebuild.
    pub fn session(mut self, session: CaptureSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Runtime that [`CapturePipeline::trigger`] spawns attempts on.
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> CaptureResult<CapturePipeline> {
        self.config.validate()?;

        let camera = self
            .camera
            .ok_or_else(|| CaptureError::config("capture pipeline needs a camera"))?;
        let sink = self
            .sink
            .ok_or_else(|| CaptureError::config("capture pipeline needs a payload sink"))?;
        let engine = match self.engine {
            Some(engine) => engine,
            None => Arc::new(JpegEngine::new(self.config.jpeg_quality)?),
        };
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|e| CaptureError::config(format!("no tokio runtime available: {}", e)))?,
        };
        let (phase, _) = watch::channel(CapturePhase::Idle);

        Ok(CapturePipeline {
            inner: Arc::new(Inner {
                camera,
                engine,
                sink,
                observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
                planner: CropPlanner::new(self.config.padding),
                config: self.config,
                session: self.session.unwrap_or_default(),
                phase,
                runtime,
            }),
        })
    }
}

impl CapturePipeline {
    pub fn builder() -> CapturePipelineBuilder {
        CapturePipelineBuilder::default()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }

    /// Session state shared with the frame analyzer.
    pub fn session(&self) -> &CaptureSession {
        &self.inner.session
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.session.is_capturing()
    }

    /// When the last attempt was accepted.
    pub fn last_capture_time(&self) -> Option<Instant> {
        self.inner.session.last_capture()
    }

    pub fn camera_ready(&self) -> bool {
        self.inner.camera.is_ready()
    }

    /// Watch the pipeline phase.
    pub fn subscribe_phase(&self) -> watch::Receiver<CapturePhase> {
        self.inner.phase.subscribe()
    }

    /// Current pipeline phase.
    pub fn phase(&self) -> CapturePhase {
        *self.inner.phase.borrow()
    }

    /// Run one attempt to completion.
    pub async fn capture(&self, request: CaptureRequest) -> CaptureOutcome {
        match self.begin() {
            Ok(guard) => self.run(guard, request).await,
            Err(reason) => CaptureOutcome::Skipped(reason),
        }
    }

    /// Start an attempt without waiting for it.
    ///
    /// The guard is evaluated and the in-flight flag claimed before this
    /// returns, so callers on a hot path never block on the attempt itself.
    pub fn trigger(&self, request: CaptureRequest) -> Result<JoinHandle<CaptureOutcome>, SkipReason> {
        let guard = self.begin()?;
        let pipeline = self.clone();
        Ok(self
            .inner
            .runtime
            .spawn(async move { pipeline.run(guard, request).await }))
    }

    fn begin(&self) -> Result<CaptureGuard, SkipReason> {
        let claimed = if self.inner.camera.is_ready() {
            self.inner
                .session
                .try_begin(Instant::now(), self.inner.config.throttle)
        } else {
            Err(SkipReason::CameraNotReady)
        };

        if let Err(reason) = &claimed {
            debug!(reason = reason.as_str(), "Capture skipped");
            metrics::record_skip(reason.as_str());
        }
        claimed
    }

    fn set_phase(&self, phase: CapturePhase) {
        self.inner.phase.send_replace(phase);
    }

    async fn run(&self, guard: CaptureGuard, request: CaptureRequest) -> CaptureOutcome {
        let logger = CaptureLogger::new();
        let span = logger.create_span();
        self.attempt(guard, request, logger).instrument(span).await
    }

    async fn attempt(
        &self,
        guard: CaptureGuard,
        request: CaptureRequest,
        logger: CaptureLogger,
    ) -> CaptureOutcome {
        let started = Instant::now();
        let inner = &self.inner;
        let mut cleanup = AttemptCleanup::new(self.clone(), logger.clone());

        logger.log_start(if request.face_region().is_some() {
            "face crop"
        } else {
            "full frame"
        });
        self.set_phase(CapturePhase::Capturing);
        inner.observer.on_capture_start();

        let options = PhotoOptions {
            flash: inner.config.flash,
            shutter_sound: inner.config.shutter_sound,
        };
        let photo = match self
            .step("take_photo", CaptureErrorKind::Acquisition, inner.camera.take_photo(options))
            .await
        {
            Ok(photo) => photo,
            Err(e) => return self.finish(guard, Err(e), &mut cleanup, &logger, started).await,
        };
        logger.log_progress(&format!("photo acquired: {}", photo));
        cleanup.photo = Some(photo.clone());

        let result = self.process(&photo, &request, &logger).await;
        self.finish(guard, result, &mut cleanup, &logger, started).await
    }

    async fn process(
        &self,
        photo: &PhotoHandle,
        request: &CaptureRequest,
        logger: &CaptureLogger,
    ) -> CaptureResult<(CapturePayload, SinkResponse)> {
        let inner = &self.inner;

        let image = match request.face_region() {
            Some((bounds, preview)) => {
                self.set_phase(CapturePhase::Cropping);
                let photo_size = self
                    .step(
                        "read_dimensions",
                        CaptureErrorKind::Transform,
                        inner.engine.dimensions(photo.path()),
                    )
                    .await?;
                let crop = inner.planner.plan(&bounds, &preview, &photo_size)?;
                logger.log_progress(&format!("{} -> {}", bounds, crop));

                self.step(
                    "crop",
                    CaptureErrorKind::Encoding,
                    inner.engine.crop_to_base64(photo.path(), crop),
                )
                .await?
            }
            None => {
                self.set_phase(CapturePhase::Encoding);
                self.step(
                    "encode",
                    CaptureErrorKind::Encoding,
                    inner.engine.encode_full(photo.path()),
                )
                .await?
            }
        };

        self.set_phase(CapturePhase::Submitting);
        let payload = CapturePayload::now(image);
        logger.log_progress(&format!("submitting {} base64 chars", payload.image_len()));

        let response = self
            .step("submit", CaptureErrorKind::Submission, inner.sink.submit(&payload))
            .await?;

        Ok((payload, response))
    }

    /// Terminal callback, photo cleanup, back to `Idle`. Dropping the guard
    /// at the end clears the in-flight flag.
    async fn finish(
        &self,
        guard: CaptureGuard,
        result: CaptureResult<(CapturePayload, SinkResponse)>,
        cleanup: &mut AttemptCleanup,
        logger: &CaptureLogger,
        started: Instant,
    ) -> CaptureOutcome {
        let inner = &self.inner;

        let outcome = match result {
            Ok((payload, response)) => {
                guard.mark_completed();
                logger.log_completion(&format!("{} base64 chars accepted", payload.image_len()));
                inner.observer.on_capture_success(&payload.image);
                CaptureOutcome::Succeeded { payload, response }
            }
            Err(e) => {
                self.set_phase(CapturePhase::Errored);
                logger.log_error(&format!("[{}] {}", e.kind().as_str(), e));
                inner.observer.on_capture_error(&e);
                CaptureOutcome::Failed(e)
            }
        };
        cleanup.terminal_sent = true;

        if let Some(photo) = cleanup.photo.take() {
            if let Err(e) = inner.camera.discard_photo(&photo).await {
                logger.log_warning(&format!("failed to delete {}: {}", photo, e));
            }
        }

        metrics::record_attempt(outcome.label(), started.elapsed().as_secs_f64() * 1000.0);
        self.set_phase(CapturePhase::Idle);
        cleanup.finished = true;
        drop(guard);
        outcome
    }

    /// Await one step, bounded by the configured step timeout if any.
    async fn step<T, E, F>(&self, step: &'static str, kind: CaptureErrorKind, fut: F) -> CaptureResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<CaptureError>,
    {
        match self.inner.config.step_timeout {
            None => fut.await.map_err(Into::into),
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(CaptureError::Timeout {
                    step,
                    kind,
                    elapsed_ms: limit.as_millis() as u64,
                }),
            },
        }
    }
}

/// Tidies up after an attempt whose future is dropped before `finish` ran.
///
/// Sends the terminal error callback if none was sent, schedules deletion of
/// the photo on the pipeline's runtime and puts the phase back to `Idle`.
struct AttemptCleanup {
    pipeline: CapturePipeline,
    logger: CaptureLogger,
    photo: Option<PhotoHandle>,
    terminal_sent: bool,
    finished: bool,
}

impl AttemptCleanup {
    fn new(pipeline: CapturePipeline, logger: CaptureLogger) -> Self {
        Self {
            pipeline,
            logger,
            photo: None,
            terminal_sent: false,
            finished: false,
        }
    }
}

impl Drop for AttemptCleanup {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let inner = &self.pipeline.inner;

        if !self.terminal_sent {
            let error = CaptureError::Cancelled {
                phase: *inner.phase.borrow(),
            };
            self.logger.log_error(&error.to_string());
            inner.observer.on_capture_error(&error);
            metrics::record_attempt("cancelled", 0.0);
        }

        if let Some(photo) = self.photo.take() {
            let camera = inner.camera.clone();
            let attempt_id = self.logger.attempt_id().to_string();
            inner.runtime.spawn(async move {
                if let Err(e) = camera.discard_photo(&photo).await {
                    warn!(attempt_id = %attempt_id, "Failed to delete {}: {}", photo, e);
                }
            });
        }

        inner.phase.send_replace(CapturePhase::Idle);
    }
}

/// Observer that logs capture events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl CaptureObserver for LoggingObserver {
    fn on_capture_start(&self) {
        tracing::info!("Capture starting");
    }

    fn on_capture_success(&self, image: &str) {
        let preview: String = image.chars().take(100).collect();
        tracing::info!(chars = image.len(), "Capture succeeded: {}...", preview);
    }

    fn on_capture_error(&self, error: &CaptureError) {
        tracing::error!(kind = error.kind().as_str(), "Capture failed: {}", error);
    }
}
