// SPDX-License-Identifier: MPL-2.0

//! Scripted landmark detector
//!
//! Replays a JSON-lines detection script: every non-empty line is a JSON array
//! of landmark sets (one set per detected hand or face). Each `detect` call
//! returns the next line, wrapping around at the end. Lines starting with `#`
//! are comments.

use super::landmarks::LandmarkSet;
use super::{LandmarkDetector, LandmarkKind};
use crate::backends::camera::types::CameraFrame;
use crate::errors::{BoothError, BoothResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

/// One detection result per script line
pub type DetectionScript = Vec<Vec<LandmarkSet>>;

/// Parse a JSON-lines detection script
pub fn parse_script(content: &str) -> Result<DetectionScript, String> {
    content
        .lines()
        .enumerate()
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            serde_json::from_str::<Vec<LandmarkSet>>(line)
                .map_err(|e| format!("line {}: {}", n + 1, e))
        })
        .collect()
}

struct ReplayInner {
    name: String,
    kind: LandmarkKind,
    source: Option<PathBuf>,
    latency: Duration,
    script: OnceLock<DetectionScript>,
    cursor: AtomicUsize,
}

/// Detector that replays a recorded script
#[derive(Clone)]
pub struct ReplayDetector {
    inner: Arc<ReplayInner>,
}

impl ReplayDetector {
    /// Detector backed by a script file, loaded on `initialize`
    ///
    /// With no path, initialization fails as if the detection library were missing.
    pub fn from_file(kind: LandmarkKind, path: Option<PathBuf>, latency: Duration) -> Self {
        Self::build(kind, path, latency, OnceLock::new())
    }

    /// Detector with an in-memory script
    pub fn from_script(kind: LandmarkKind, script: DetectionScript, latency: Duration) -> Self {
        let loaded = OnceLock::new();
        if !script.is_empty() {
            let _ = loaded.set(script);
        }
        Self::build(kind, None, latency, loaded)
    }

    fn build(
        kind: LandmarkKind,
        source: Option<PathBuf>,
        latency: Duration,
        script: OnceLock<DetectionScript>,
    ) -> Self {
        Self {
            inner: Arc::new(ReplayInner {
                name: format!("replay-{}", kind),
                kind,
                source,
                latency,
                script,
                cursor: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of frames in the loaded script (0 before initialization)
    pub fn script_len(&self) -> usize {
        self.inner.script.get().map_or(0, Vec::len)
    }

    async fn load(&self) -> BoothResult<()> {
        if self.inner.script.get().is_some() {
            return Ok(());
        }

        let kind = self.inner.kind;
        let path = self.inner.source.as_ref().ok_or_else(|| {
            BoothError::PerceptionLibraryUnavailable(format!("no {} landmark script configured", kind))
        })?;

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            BoothError::PerceptionLibraryUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let script = parse_script(&content).map_err(|e| {
            BoothError::PerceptionLibraryUnavailable(format!("{}: {}", path.display(), e))
        })?;
        if script.is_empty() {
            return Err(BoothError::PerceptionLibraryUnavailable(format!(
                "{}: script is empty",
                path.display()
            )));
        }

        info!(
            detector = %self.inner.name,
            path = %path.display(),
            frames = script.len(),
            "Loaded landmark script"
        );
        // A concurrent initialize may have won; either script is equivalent
        let _ = self.inner.script.set(script);
        Ok(())
    }
}

impl LandmarkDetector for ReplayDetector {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn kind(&self) -> LandmarkKind {
        self.inner.kind
    }

    fn initialize(&self) -> BoxFuture<'_, BoothResult<()>> {
        self.load().boxed()
    }

    fn detect(
        &self,
        _frame: Arc<CameraFrame>,
    ) -> BoxFuture<'static, Result<Vec<LandmarkSet>, String>> {
        let inner = Arc::clone(&self.inner);
        async move {
            let script = inner
                .script
                .get()
                .ok_or_else(|| format!("{} is not initialized", inner.name))?;
            let index = inner.cursor.fetch_add(1, Ordering::Relaxed) % script.len();
            let result = script[index].clone();
            if !inner.latency.is_zero() {
                tokio::time::sleep(inner.latency).await;
            }
            debug!(detector = %inner.name, index, sets = result.len(), "Replayed detection");
            Ok(result)
        }
        .boxed()
    }
}
