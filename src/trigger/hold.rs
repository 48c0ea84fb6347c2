// SPDX-License-Identifier: MPL-2.0

//! Hold-to-trigger state machine
//!
//! Sampled on a fixed tick. A capture fires once both predicates have held
//! continuously for the required time. The machine is pure: time comes in as
//! an argument, so tests drive it with explicit timestamps.

use crate::constants::hold;

/// Status label while idle
pub const STATUS_SCANNING: &str = "SCANNING";
/// Status label while a hold is accumulating
pub const STATUS_SYNCING: &str = "SYNC_IN_PROGRESS";

/// Hint shown when only the gesture is present
pub const HINT_NEED_SMILE: &str = "WAITING_FOR_SMILE";
/// Hint shown when only the smile is present
pub const HINT_NEED_GESTURE: &str = "WAITING_FOR_GESTURE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPhase {
    #[default]
    Scanning,
    Holding {
        since_ms: u64,
    },
}

/// Result of one sampling tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Evaluation suspended (locked out, not ready, or faulted)
    Skipped,
    /// Predicates not both true; any hold was cleared
    Idle,
    /// Hold in progress
    Holding { progress: u8 },
    /// Hold completed on this tick
    Triggered,
}

/// Why a tick may not evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickGate {
    pub locked: bool,
    pub ready: bool,
    pub faulted: bool,
}

impl TickGate {
    pub fn open() -> Self {
        Self {
            locked: false,
            ready: true,
            faulted: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ready && !self.locked && !self.faulted
    }
}

#[derive(Debug, Clone)]
pub struct HoldTrigger {
    required_ms: u64,
    grace_ms: u64,
    phase: HoldPhase,
    progress: u8,
    last_dual_ms: Option<u64>,
    hint: Option<&'static str>,
}

impl Default for HoldTrigger {
    fn default() -> Self {
        Self::new(hold::REQUIRED_HOLD_MS, hold::DEFAULT_GRACE_MS)
    }
}

impl HoldTrigger {
    pub fn new(required_ms: u64, grace_ms: u64) -> Self {
        Self {
            required_ms: required_ms.max(1),
            grace_ms,
            phase: HoldPhase::Scanning,
            progress: 0,
            last_dual_ms: None,
            hint: None,
        }
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    /// Start of the current hold, `None` whenever no hold is in progress
    pub fn hold_start_ms(&self) -> Option<u64> {
        match self.phase {
            HoldPhase::Holding { since_ms } => Some(since_ms),
            HoldPhase::Scanning => None,
        }
    }

    /// Hold progress, 0..=100
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status_label(&self) -> &'static str {
        match self.phase {
            HoldPhase::Scanning => STATUS_SCANNING,
            HoldPhase::Holding { .. } => STATUS_SYNCING,
        }
    }

    /// Which predicate is still missing, if exactly one holds
    pub fn hint(&self) -> Option<&'static str> {
        self.hint
    }

    /// Drop any hold in progress
    pub fn reset(&mut self) {
        self.phase = HoldPhase::Scanning;
        self.progress = 0;
        self.last_dual_ms = None;
        self.hint = None;
    }

    fn progress_at(&self, since_ms: u64, now_ms: u64) -> u8 {
        let elapsed = now_ms.saturating_sub(since_ms);
        (elapsed.saturating_mul(100) / self.required_ms).min(100) as u8
    }

    /// Evaluate one sample
    pub fn tick(&mut self, now_ms: u64, hand: bool, face: bool, gate: TickGate) -> TickOutcome {
        if !gate.is_open() {
            return TickOutcome::Skipped;
        }

        self.hint = match (hand, face) {
            (true, false) => Some(HINT_NEED_SMILE),
            (false, true) => Some(HINT_NEED_GESTURE),
            _ => None,
        };

        if hand && face {
            self.last_dual_ms = Some(now_ms);
            let since_ms = match self.phase {
                HoldPhase::Holding { since_ms } => since_ms,
                HoldPhase::Scanning => {
                    self.phase = HoldPhase::Holding { since_ms: now_ms };
                    now_ms
                }
            };
            self.progress = self.progress_at(since_ms, now_ms);

            if now_ms.saturating_sub(since_ms) >= self.required_ms {
                self.phase = HoldPhase::Scanning;
                self.last_dual_ms = None;
                return TickOutcome::Triggered;
            }
            return TickOutcome::Holding {
                progress: self.progress,
            };
        }

        // Within the grace window a dropout neither resets nor advances the hold
        if let (HoldPhase::Holding { .. }, Some(last)) = (self.phase, self.last_dual_ms) {
            if self.grace_ms > 0 && now_ms.saturating_sub(last) <= self.grace_ms {
                return TickOutcome::Holding {
                    progress: self.progress,
                };
            }
        }

        self.phase = HoldPhase::Scanning;
        self.progress = 0;
        self.last_dual_ms = None;
        TickOutcome::Idle
    }
}
