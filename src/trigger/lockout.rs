// SPDX-License-Identifier: MPL-2.0

//! Post-capture lockout
//!
//! After a capture no new trigger may fire until the countdown reaches zero.
//! The countdown only moves through [`Lockout::tick_second`], which the
//! engine calls once per elapsed second.

use crate::constants::lockout::COOLDOWN_SECONDS;

/// Status label while the lockout is engaged
pub const STATUS_COMMITTED: &str = "ARCHIVE_COMMITTED";
/// Status label once the lockout clears
pub const STATUS_MONITORING: &str = "MONITORING";

/// Invariant: locked exactly when seconds remain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lockout {
    remaining: u8,
}

impl Lockout {
    /// Engage with the default cooldown
    pub fn engage(&mut self) {
        self.engage_for(COOLDOWN_SECONDS);
    }

    pub fn engage_for(&mut self, seconds: u8) {
        self.remaining = seconds;
    }

    pub fn is_locked(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Advance one second; returns true on the tick that clears the lockout
    pub fn tick_second(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Clear without counting down (used when the engine re-initializes)
    pub fn clear(&mut self) {
        self.remaining = 0;
    }
}
