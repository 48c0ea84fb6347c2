// SPDX-License-Identifier: MPL-2.0

//! Capture triggering: the hold state machine and the post-capture lockout

pub mod hold;
pub mod lockout;

pub use hold::{HoldPhase, HoldTrigger, TickGate, TickOutcome};
pub use lockout::Lockout;
