// SPDX-License-Identifier: MPL-2.0

//! Scriptable collaborators for driving the engine in tests

#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use gesture_booth::backends::camera::{
    CameraFrame, CameraSource, FrameReceiver, frame_channel,
};
use gesture_booth::config::BoothConfig;
use gesture_booth::constants::landmarks::*;
use gesture_booth::engine::{BoothEngine, BoothHandle, BoothView, Collaborators};
use gesture_booth::errors::{BoothError, BoothResult};
use gesture_booth::perception::{Landmark, LandmarkDetector, LandmarkSet, LandmarkKind};
use gesture_booth::share::ShareUploader;
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// 21-point hand; `up` flags index, middle, ring, pinky
pub fn hand(up: [bool; 4]) -> LandmarkSet {
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT];
    let fingers = [
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
    for ((tip, pip), is_up) in fingers.into_iter().zip(up) {
        points[pip].y = 0.5;
        points[tip].y = if is_up { 0.3 } else { 0.6 };
    }
    LandmarkSet::new(points)
}

pub fn peace_sign() -> LandmarkSet {
    hand([true, true, false, false])
}

/// Face mesh whose mouth/face width ratio is `ratio`
pub fn face_with_ratio(ratio: f32) -> LandmarkSet {
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 468];
    points[CHEEK_LEFT] = Landmark::new(0.25, 0.5, 0.0);
    points[CHEEK_RIGHT] = Landmark::new(0.75, 0.5, 0.0);
    let half_mouth = ratio * 0.5 / 2.0;
    points[MOUTH_LEFT] = Landmark::new(0.5 - half_mouth, 0.7, 0.0);
    points[MOUTH_RIGHT] = Landmark::new(0.5 + half_mouth, 0.7, 0.0);
    LandmarkSet::new(points)
}

pub fn smiling_face() -> LandmarkSet {
    face_with_ratio(0.55)
}

/// Camera that emits a small frame every [`FRAME_INTERVAL`] on the runtime
#[derive(Clone, Default)]
pub struct TickingCamera {
    fail_with: Arc<Mutex<Option<BoothError>>>,
    start_delay: Arc<Mutex<Duration>>,
    starts: Arc<AtomicUsize>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TickingCamera {
    /// Make every following `start` fail with `err` (or succeed with `None`)
    pub fn fail_with(&self, err: Option<BoothError>) {
        *self.fail_with.lock().unwrap() = err;
    }

    /// Block the calling thread this long (real time) inside `start`
    pub fn slow_start(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = delay;
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl CameraSource for TickingCamera {
    fn name(&self) -> &str {
        "ticking-test-camera"
    }

    fn start(&mut self) -> BoothResult<FrameReceiver> {
        self.stop();
        self.starts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.start_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }

        let (mut sender, receiver) = frame_channel(4);
        let image = Arc::new(RgbaImage::from_pixel(32, 24, image::Rgba([90, 120, 150, 255])));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            let mut sequence = 0;
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                let _ = sender.try_send(CameraFrame::new(Arc::clone(&image), sequence));
                sequence += 1;
            }
        });
        *self.task.lock().unwrap() = Some(task);
        Ok(receiver)
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Detector whose answer the test switches at will
#[derive(Clone)]
pub struct SwitchDetector {
    kind: LandmarkKind,
    current: Arc<Mutex<Vec<LandmarkSet>>>,
    init_error: Arc<Mutex<Option<BoothError>>>,
    stalled: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl SwitchDetector {
    pub fn new(kind: LandmarkKind) -> Self {
        Self {
            kind,
            current: Arc::default(),
            init_error: Arc::default(),
            stalled: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn set(&self, sets: Vec<LandmarkSet>) {
        *self.current.lock().unwrap() = sets;
    }

    pub fn fail_init(&self, err: Option<BoothError>) {
        *self.init_error.lock().unwrap() = err;
    }

    /// Make following detections never complete
    pub fn stall(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LandmarkDetector for SwitchDetector {
    fn name(&self) -> &str {
        "switch"
    }

    fn kind(&self) -> LandmarkKind {
        self.kind
    }

    fn initialize(&self) -> BoxFuture<'_, BoothResult<()>> {
        let result = match self.init_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        async move { result }.boxed()
    }

    fn detect(
        &self,
        _frame: Arc<CameraFrame>,
    ) -> BoxFuture<'static, Result<Vec<LandmarkSet>, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            return futures::future::pending().boxed();
        }
        let sets = self.current.lock().unwrap().clone();
        async move { Ok(sets) }.boxed()
    }
}

/// Uploader answering from a queue, then succeeding
#[derive(Clone, Default)]
pub struct MockUploader {
    queued: Arc<Mutex<VecDeque<BoothResult<String>>>>,
    uploads: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl MockUploader {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push(&self, result: BoothResult<String>) {
        self.queued.lock().unwrap().push_back(result);
    }

    /// File names uploaded so far
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

impl ShareUploader for MockUploader {
    fn upload(
        &self,
        file_name: String,
        _png: Arc<Vec<u8>>,
    ) -> BoxFuture<'static, BoothResult<String>> {
        self.uploads.lock().unwrap().push(file_name.clone());
        let result = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("https://tmpfiles.org/dl/42/{}", file_name)));
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            result
        }
        .boxed()
    }
}

/// A running engine plus the handles a test steers it with
pub struct Booth {
    pub handle: BoothHandle,
    pub task: JoinHandle<()>,
    pub camera: TickingCamera,
    pub hands: SwitchDetector,
    pub faces: SwitchDetector,
    pub uploader: MockUploader,
}

pub struct BoothBuilder {
    pub config: BoothConfig,
    pub camera: TickingCamera,
    pub hands: SwitchDetector,
    pub faces: SwitchDetector,
    pub uploader: MockUploader,
}

impl BoothBuilder {
    pub fn new() -> Self {
        Self {
            config: BoothConfig::default(),
            camera: TickingCamera::default(),
            hands: SwitchDetector::new(LandmarkKind::Hand),
            faces: SwitchDetector::new(LandmarkKind::Face),
            uploader: MockUploader::with_delay(Duration::from_millis(100)),
        }
    }

    pub fn spawn(self) -> Booth {
        let collaborators = Collaborators {
            camera: Box::new(self.camera.clone()),
            hand_detector: Arc::new(self.hands.clone()),
            face_detector: Arc::new(self.faces.clone()),
            uploader: Arc::new(self.uploader.clone()),
        };
        let (engine, handle) = BoothEngine::new(self.config, collaborators);
        Booth {
            handle,
            task: engine.spawn(),
            camera: self.camera,
            hands: self.hands,
            faces: self.faces,
            uploader: self.uploader,
        }
    }
}

impl Booth {
    /// Show (or stop showing) the peace sign and the smile
    pub fn pose(&self, hand: bool, smile: bool) {
        self.hands.set(if hand { vec![peace_sign()] } else { vec![] });
        self.faces
            .set(vec![if smile { smiling_face() } else { face_with_ratio(0.42) }]);
    }

    /// Wait until the published view satisfies `pred`
    pub async fn wait_for(&self, what: &str, pred: impl FnMut(&BoothView) -> bool) -> BoothView {
        let mut views = self.handle.subscribe_view();
        let view = tokio::time::timeout(Duration::from_secs(20), views.wait_for(pred))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
            .expect("engine stopped")
            .clone();
        view
    }

    pub fn log_messages(view: &BoothView) -> Vec<String> {
        view.log.iter().map(|e| e.message.clone()).collect()
    }

    pub async fn stop(self) {
        self.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("engine did not stop")
            .expect("engine task panicked");
    }
}
