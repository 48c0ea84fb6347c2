// SPDX-License-Identifier: GPL-3.0-only

//! Engine lifecycle context and clocks
//!
//! Every loop and callback receives an [`EngineContext`] and checks
//! [`EngineContext::is_active`] before acting, so tearing the engine down stops
//! all further scheduling from one place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

/// Shared lifecycle flags
#[derive(Debug, Clone)]
pub struct EngineContext {
    active: Arc<watch::Sender<bool>>,
    ready: Arc<AtomicBool>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineContext {
    pub fn new() -> Self {
        let (active, _) = watch::channel(true);
        Self {
            active: Arc::new(active),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// False once [`shutdown`](Self::shutdown) has been called
    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Stop every loop; in-flight work drops its result when it completes
    pub fn shutdown(&self) {
        self.ready.store(false, Ordering::SeqCst);
        if self.active.send_replace(false) {
            info!("Engine shutdown requested");
        }
    }

    /// Perception and camera finished first-time initialization
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn set_ready(&self, ready: bool) {
        debug!(ready, "Engine readiness changed");
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Resolves once shutdown has been requested; any number of tasks may wait
    pub async fn shutdown_requested(&self) {
        let mut active = self.active.subscribe();
        // The sender lives in self, so the channel cannot close under us
        let _ = active.wait_for(|active| !*active).await;
    }
}

/// Millisecond clock injected into the state machines
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Monotonic clock based on tokio's Instant (follows paused time in tests)
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
