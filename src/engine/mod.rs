// SPDX-License-Identifier: MPL-2.0

//! Booth engine
//!
//! One task owns all mutable booth state and multiplexes every input:
//!
//! ```text
//!  camera frames ─┐
//!  render tick ───┤
//!  sample tick ───┤                ┌─ view (watch) ──────▶ front end
//!  lockout tick ──┼──▶ BoothEngine ┤
//!  commands ──────┤                └─ composite (watch) ─▶ front end
//!  uploads/captures┘
//! ```
//!
//! Perception and uploads run as spawned tasks. Perception writes the shared
//! snapshot directly; encodes and uploads report back through an event
//! channel so their results are applied on the engine task. Camera start and
//! stop wait on the device, so they run on the blocking pool.

pub mod state;

pub use state::{BoothState, BoothView, ErrorView, PhotoSummary};

use crate::backends::camera::{self, CameraFrame, CameraSource, FrameReceiver};
use crate::compositor::Compositor;
use crate::config::BoothConfig;
use crate::constants::lockout;
use crate::errors::{BoothError, BoothResult};
use crate::gallery::{PhotoId, PhotoStatus};
use crate::lifecycle::{Clock, EngineContext, MonotonicClock};
use crate::perception::{
    Ingestor, LandmarkDetector, LandmarkKind, LandmarkSnapshot, ReplayDetector, SnapshotCell,
};
use crate::pipelines::photo::{CaptureRequest, encode_capture};
use crate::share::{ShareUploader, TmpfilesUploader};
use crate::storage;
use crate::trigger::hold::{STATUS_SCANNING, STATUS_SYNCING};
use crate::trigger::lockout::{STATUS_COMMITTED, STATUS_MONITORING};
use crate::trigger::{HoldTrigger, TickGate, TickOutcome};
use futures::StreamExt;
use image::RgbaImage;
use state::{LOG_CAPTURE_NO_FRAME, LOG_OPTICS_ACTIVE, LOG_REQUESTING_MEDIA, STATUS_INITIALIZING};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Requests from a front end
#[derive(Debug, Clone, PartialEq)]
pub enum BoothCommand {
    Select(PhotoId),
    ClearSelection,
    /// Move the selection towards older photos
    SelectNext,
    /// Move the selection towards newer photos
    SelectPrevious,
    RetryUpload(PhotoId),
    RetrySelectedUpload,
    RetryInitialization,
    Shutdown,
}

/// Results posted back to the engine task
#[derive(Debug)]
enum EngineEvent {
    Encoded {
        id: PhotoId,
        result: BoothResult<Arc<Vec<u8>>>,
    },
    Uploaded {
        id: PhotoId,
        attempt: u64,
        result: BoothResult<String>,
    },
}

/// External collaborators the engine drives
pub struct Collaborators {
    pub camera: Box<dyn CameraSource>,
    pub hand_detector: Arc<dyn LandmarkDetector>,
    pub face_detector: Arc<dyn LandmarkDetector>,
    pub uploader: Arc<dyn ShareUploader>,
}

impl Collaborators {
    /// Camera, replay detectors and file host as configured
    pub fn from_config(config: &BoothConfig) -> BoothResult<Self> {
        let latency = Duration::from_millis(config.replay_latency_ms);
        let uploader = TmpfilesUploader::new(
            config.upload_url.clone(),
            Duration::from_secs(config.upload_timeout_secs),
        )?;

        Ok(Self {
            camera: camera::from_config(config),
            hand_detector: Arc::new(ReplayDetector::from_file(
                LandmarkKind::Hand,
                config.hand_script.clone(),
                latency,
            )),
            face_detector: Arc::new(ReplayDetector::from_file(
                LandmarkKind::Face,
                config.face_script.clone(),
                latency,
            )),
            uploader: Arc::new(uploader),
        })
    }
}

/// Front-end side of a running engine
#[derive(Clone)]
pub struct BoothHandle {
    commands: mpsc::UnboundedSender<BoothCommand>,
    view: watch::Receiver<BoothView>,
    frames: watch::Receiver<Option<Arc<RgbaImage>>>,
    snapshot: SnapshotCell,
    ctx: EngineContext,
}

impl BoothHandle {
    /// Queue a command; false once the engine has stopped
    pub fn send(&self, command: BoothCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Latest view
    pub fn view(&self) -> BoothView {
        self.view.borrow().clone()
    }

    /// Receiver notified whenever the view changes
    pub fn subscribe_view(&self) -> watch::Receiver<BoothView> {
        self.view.clone()
    }

    /// Receiver for the latest composited frame
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<Arc<RgbaImage>>> {
        self.frames.clone()
    }

    /// Current perception snapshot
    pub fn snapshot(&self) -> LandmarkSnapshot {
        self.snapshot.current()
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Stop the engine, interrupting an initialization in progress
    pub fn shutdown(&self) {
        self.ctx.shutdown();
        self.send(BoothCommand::Shutdown);
    }
}

pub struct BoothEngine {
    config: BoothConfig,
    ctx: EngineContext,
    clock: Arc<dyn Clock>,
    /// `None` while a start or stop runs on the blocking pool
    camera: Option<Box<dyn CameraSource>>,
    camera_name: String,
    hand_detector: Arc<dyn LandmarkDetector>,
    face_detector: Arc<dyn LandmarkDetector>,
    uploader: Arc<dyn ShareUploader>,
    compositor: Compositor,
    ingestor: Ingestor,
    snapshot_rx: watch::Receiver<LandmarkSnapshot>,
    state: BoothState,
    frames: Option<FrameReceiver>,
    latest_frame: Option<Arc<CameraFrame>>,
    latest_composite: Option<Arc<RgbaImage>>,
    frame_dirty: bool,
    lockout_deadline: Option<Instant>,
    upload_attempts: HashMap<PhotoId, u64>,
    commands: mpsc::UnboundedReceiver<BoothCommand>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    view_tx: watch::Sender<BoothView>,
    frame_tx: watch::Sender<Option<Arc<RgbaImage>>>,
}

impl BoothEngine {
    /// Build an engine on the monotonic clock
    pub fn new(config: BoothConfig, collaborators: Collaborators) -> (Self, BoothHandle) {
        Self::with_clock(config, collaborators, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        config: BoothConfig,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> (Self, BoothHandle) {
        let ctx = EngineContext::new();
        let cell = SnapshotCell::new();
        let ingestor = Ingestor::new(cell.clone(), Arc::clone(&clock), config.smile);
        let state = BoothState::new(HoldTrigger::new(
            config.required_hold_ms,
            config.hold_grace_ms,
        ));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(state.view());
        let (frame_tx, frame_rx) = watch::channel(None);

        let handle = BoothHandle {
            commands: command_tx,
            view: view_rx,
            frames: frame_rx,
            snapshot: cell.clone(),
            ctx: ctx.clone(),
        };

        let engine = Self {
            compositor: Compositor::new(&config),
            config,
            ctx,
            clock,
            camera_name: collaborators.camera.name().to_string(),
            camera: Some(collaborators.camera),
            hand_detector: collaborators.hand_detector,
            face_detector: collaborators.face_detector,
            uploader: collaborators.uploader,
            ingestor,
            snapshot_rx: cell.subscribe(),
            state,
            frames: None,
            latest_frame: None,
            latest_composite: None,
            frame_dirty: false,
            lockout_deadline: None,
            upload_attempts: HashMap::new(),
            commands: command_rx,
            events_tx,
            events_rx,
            view_tx,
            frame_tx,
        };

        (engine, handle)
    }

    /// Spawn the engine on the current runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until shutdown
    pub async fn run(mut self) {
        let ctx = self.ctx.clone();
        info!(version = crate::constants::app_info::version(), "Booth engine starting");

        tokio::select! {
            _ = ctx.shutdown_requested() => {}
            _ = self.initialize() => {}
        }

        let mut render = tokio::time::interval(Duration::from_millis(self.config.render_interval_ms));
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sample = tokio::time::interval(Duration::from_millis(self.config.sample_interval_ms));
        sample.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while ctx.is_active() {
            let deadline = self.lockout_deadline;

            tokio::select! {
                biased;

                _ = ctx.shutdown_requested() => break,

                Some(command) = self.commands.recv() => {
                    if command == BoothCommand::Shutdown {
                        break;
                    }
                    self.handle_command(command).await;
                }

                Some(event) = self.events_rx.recv() => self.handle_event(event),

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.lockout_tick();
                }

                _ = sample.tick() => self.sample_tick(),

                frame = next_frame(&mut self.frames) => self.on_frame(frame).await,

                _ = render.tick() => self.render_tick(),
            }

            self.publish();
        }

        self.teardown().await;
    }

    fn publish(&self) {
        let view = self.state.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn log(&mut self, message: impl Into<String>) {
        self.state.log.push(message);
    }

    async fn teardown(&mut self) {
        self.ctx.shutdown();
        self.stop_camera().await;
        self.state.ready = false;
        self.publish();
        info!("Booth engine stopped");
    }

    /// Run a camera call on the blocking pool
    ///
    /// Returns `None` when the camera is gone (a previous call panicked or was
    /// abandoned by shutdown).
    async fn with_camera<T, F>(&mut self, op: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn CameraSource) -> T + Send + 'static,
    {
        let mut camera = self.camera.take()?;
        let joined = tokio::task::spawn_blocking(move || {
            let out = op(&mut *camera);
            (camera, out)
        })
        .await;

        match joined {
            Ok((camera, out)) => {
                self.camera = Some(camera);
                Some(out)
            }
            Err(e) => {
                error!(error = %e, camera = %self.camera_name, "Camera call failed");
                None
            }
        }
    }

    async fn start_camera(&mut self) -> BoothResult<FrameReceiver> {
        self.frames = None;
        match self.with_camera(|camera| camera.start()).await {
            Some(started) => started,
            None => Err(BoothError::CameraDriverFault(format!(
                "{} is unavailable",
                self.camera_name
            ))),
        }
    }

    async fn stop_camera(&mut self) {
        self.frames = None;
        self.with_camera(|camera| camera.stop()).await;
    }

    /// Start detectors, then the camera
    async fn initialize(&mut self) {
        self.stop_camera().await;
        self.latest_frame = None;
        self.latest_composite = None;
        self.frame_tx.send_replace(None);
        self.state.error = None;
        self.state.ready = false;
        self.ctx.set_ready(false);
        self.state.hold.reset();
        self.state.lockout.clear();
        self.lockout_deadline = None;
        self.ingestor.cell().clear();

        self.state.status = STATUS_INITIALIZING;
        self.log(LOG_REQUESTING_MEDIA);
        self.publish();

        info!(
            hands = self.hand_detector.name(),
            faces = self.face_detector.name(),
            camera = %self.camera_name,
            "Initializing perception and camera"
        );

        let detectors = futures::future::try_join(
            self.hand_detector.initialize(),
            self.face_detector.initialize(),
        )
        .await;

        let started = match detectors {
            Ok(_) => self.start_camera().await,
            Err(e) => Err(e),
        };

        match started {
            Ok(frames) => {
                self.frames = Some(frames);
                self.state.ready = true;
                self.ctx.set_ready(true);
                self.state.status = STATUS_MONITORING;
                self.log(LOG_OPTICS_ACTIVE);
                info!("Booth ready");
            }
            Err(e) => self.fail(e).await,
        }
    }

    /// Enter the fatal error state
    async fn fail(&mut self, err: BoothError) {
        let err = if err.is_fatal() {
            err
        } else {
            BoothError::CameraDriverFault(err.to_string())
        };
        error!(error = %err, "Booth halted");

        if let Some(presentation) = err.presentation() {
            self.state.status = presentation.status;
            self.log(presentation.log_line);
        }
        self.state.ready = false;
        self.ctx.set_ready(false);
        self.state.hold.reset();
        self.state.error = Some(err);
        self.publish();
        self.stop_camera().await;
    }

    fn perception_open(&self) -> bool {
        self.ctx.is_active()
            && self.state.ready
            && self.state.error.is_none()
            && !self.state.lockout.is_locked()
    }

    async fn on_frame(&mut self, frame: Option<CameraFrame>) {
        let Some(frame) = frame else {
            self.frames = None;
            if self.state.ready && self.ctx.is_active() {
                self.fail(BoothError::CameraDriverFault("frame stream ended".into()))
                    .await;
            }
            return;
        };
        if self.state.error.is_some() {
            return;
        }

        let frame = Arc::new(frame);
        self.latest_frame = Some(Arc::clone(&frame));
        self.frame_dirty = true;

        // Frames are withheld from perception during the lockout
        if self.perception_open() {
            self.ingestor
                .submit(&self.hand_detector, Arc::clone(&frame), &self.ctx);
            self.ingestor.submit(&self.face_detector, frame, &self.ctx);
        }
    }

    fn render_tick(&mut self) {
        let snapshot_changed = self.snapshot_rx.has_changed().unwrap_or(false);
        if !self.frame_dirty && !snapshot_changed {
            return;
        }
        let Some(frame) = self.latest_frame.as_ref() else {
            return;
        };

        let snapshot = self.snapshot_rx.borrow_and_update().clone();
        let composite = Arc::new(self.compositor.render(&frame.image, &snapshot));
        self.latest_composite = Some(Arc::clone(&composite));
        self.frame_tx.send_replace(Some(composite));
        self.frame_dirty = false;
    }

    fn sample_tick(&mut self) {
        let gate = TickGate {
            locked: self.state.lockout.is_locked(),
            ready: self.state.ready,
            faulted: self.state.error.is_some(),
        };
        let snapshot = self.ingestor.cell().current();
        let now = self.clock.now_ms();

        let outcome = self.state.hold.tick(
            now,
            snapshot.hand_predicate,
            snapshot.face_predicate,
            gate,
        );
        if outcome != TickOutcome::Skipped {
            self.state.hand_active = snapshot.hand_predicate;
            self.state.face_active = snapshot.face_predicate;
            self.state.face_score = snapshot.face_score;
        }

        match outcome {
            TickOutcome::Skipped => {}
            TickOutcome::Idle => self.state.status = STATUS_SCANNING,
            TickOutcome::Holding { .. } => self.state.status = STATUS_SYNCING,
            TickOutcome::Triggered => self.trigger_capture(),
        }
    }

    fn trigger_capture(&mut self) {
        let image = match (&self.latest_composite, &self.latest_frame) {
            (Some(composite), _) => Arc::clone(composite),
            (None, Some(frame)) => Arc::new(self.compositor.mirror(&frame.image)),
            (None, None) => {
                // Nothing was captured, so there is nothing to lock out for
                warn!("Trigger fired without a frame, nothing to capture");
                self.state.status = STATUS_MONITORING;
                self.log(LOG_CAPTURE_NO_FRAME);
                return;
            }
        };

        self.state.lockout.engage_for(self.config.cooldown_seconds);
        if self.state.lockout.is_locked() {
            self.lockout_deadline = Some(Instant::now() + lockout::TICK);
            self.state.status = STATUS_COMMITTED;
        } else {
            self.state.status = STATUS_MONITORING;
        }

        let request = CaptureRequest::new(image, self.config.resolution_label());
        let id = request.id;
        info!(%id, "Capture triggered");
        self.state.record_capture(request.pending_photo());
        self.start_encode(id);
    }

    /// Encode a photo's PNG off the engine task
    fn start_encode(&mut self, id: PhotoId) {
        let Some(photo) = self.state.roll.get_mut(id) else {
            warn!(%id, "Encode requested for unknown photo");
            return;
        };
        photo.status = PhotoStatus::Uploading;
        let image = Arc::clone(&photo.image);

        let events = self.events_tx.clone();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let result = encode_capture(id, image).await;
            if ctx.is_active() {
                let _ = events.send(EngineEvent::Encoded { id, result });
            }
        });
    }

    fn lockout_tick(&mut self) {
        if self.state.lockout.tick_second() {
            debug!("Lockout cleared");
            self.lockout_deadline = None;
            self.state.hold.reset();
            self.state.status = STATUS_MONITORING;
        } else if self.state.lockout.is_locked() {
            self.lockout_deadline = self.lockout_deadline.map(|d| d + lockout::TICK);
        } else {
            self.lockout_deadline = None;
        }
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Encoded { id, result: Ok(png) } => {
                let Some(photo) = self.state.roll.get_mut(id) else {
                    return;
                };
                photo.png = png;
                if let Some(dir) = self.config.archive_dir.clone() {
                    storage::spawn_archive(dir, photo.clone());
                }
                self.start_upload(id);
            }
            EngineEvent::Encoded { id, result: Err(e) } => {
                warn!(%id, error = %e, "Capture failed");
                self.state.capture_failed(id);
            }
            EngineEvent::Uploaded {
                id,
                attempt,
                result,
            } => self.finish_upload(id, attempt, result),
        }
    }

    fn start_upload(&mut self, id: PhotoId) {
        let Some(photo) = self.state.roll.get_mut(id) else {
            warn!(%id, "Upload requested for unknown photo");
            return;
        };
        photo.status = PhotoStatus::Uploading;
        photo.share_url = None;
        let png = Arc::clone(&photo.png);

        let attempt = self.upload_attempts.entry(id).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;

        self.log(format!("INIT_UPLINK_{}", id));

        let pending = self.uploader.upload(format!("{}.png", id), png);
        let events = self.events_tx.clone();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let result = pending.await;
            // Late results after shutdown are dropped
            if ctx.is_active() {
                let _ = events.send(EngineEvent::Uploaded {
                    id,
                    attempt,
                    result,
                });
            }
        });
    }

    fn finish_upload(&mut self, id: PhotoId, attempt: u64, result: BoothResult<String>) {
        if self.upload_attempts.get(&id) != Some(&attempt) {
            debug!(%id, attempt, "Ignoring superseded upload result");
            return;
        }
        let Some(photo) = self.state.roll.get_mut(id) else {
            return;
        };

        match result {
            Ok(url) => {
                photo.status = PhotoStatus::Success;
                photo.share_url = Some(url);
                self.log(format!("ASSET_{}_SYNCED", id));
            }
            Err(e) => {
                photo.status = PhotoStatus::Error;
                warn!(%id, error = %e, "Upload failed");
                self.log(format!("ERROR: UPLINK_FAULT_{}", id));
            }
        }
    }

    fn retry_upload(&mut self, id: PhotoId) {
        match self.state.roll.get(id).map(|p| (p.status, p.is_encoded())) {
            None => warn!(%id, "Retry requested for unknown photo"),
            Some((PhotoStatus::Uploading, _)) => debug!(%id, "Upload already in flight"),
            Some((_, false)) => self.start_encode(id),
            Some((_, true)) => self.start_upload(id),
        }
    }

    async fn handle_command(&mut self, command: BoothCommand) {
        debug!(?command, "Command");
        match command {
            BoothCommand::Select(id) => {
                if !self.state.roll.select(id) {
                    warn!(%id, "Cannot select unknown photo");
                }
            }
            BoothCommand::ClearSelection => self.state.roll.clear_selection(),
            BoothCommand::SelectNext => {
                self.state.roll.step_selection(1);
            }
            BoothCommand::SelectPrevious => {
                self.state.roll.step_selection(-1);
            }
            BoothCommand::RetryUpload(id) => self.retry_upload(id),
            BoothCommand::RetrySelectedUpload => {
                if let Some(id) = self.state.roll.selected_id() {
                    self.retry_upload(id);
                }
            }
            BoothCommand::RetryInitialization => {
                if self.state.ready && self.state.error.is_none() {
                    debug!("Already initialized, ignoring retry");
                } else {
                    let ctx = self.ctx.clone();
                    tokio::select! {
                        _ = ctx.shutdown_requested() => {}
                        _ = self.initialize() => {}
                    }
                }
            }
            BoothCommand::Shutdown => self.ctx.shutdown(),
        }
    }
}

async fn next_frame(frames: &mut Option<FrameReceiver>) -> Option<CameraFrame> {
    match frames {
        Some(receiver) => receiver.next().await,
        None => std::future::pending().await,
    }
}
