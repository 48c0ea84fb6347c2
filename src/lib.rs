// SPDX-License-Identifier: MPL-2.0

//! Gesture Booth - a photo booth kiosk that captures when you smile and hold
//! up a peace sign
//!
//! # Architecture
//!
//! - [`backends`]: Camera sources (V4L2 through GStreamer, looping still image)
//! - [`perception`]: Landmark detectors, gesture and smile predicates, the shared snapshot
//! - [`trigger`]: Hold-to-capture state machine and post-capture lockout
//! - [`compositor`]: Mirroring, colour grading and face overlays
//! - [`pipelines`]: PNG encoding and photo record assembly
//! - [`share`]: Uploads to the file host and QR links
//! - [`gallery`]: The session's photo roll
//! - [`engine`]: The task that ties everything together
//! - [`terminal`]: Terminal kiosk front end
//! - [`config`]: User configuration handling
//! - [`storage`]: Optional on-disk archive of captures
//!
//! # Example
//!
//! ```ignore
//! let config = BoothConfig::load_or_default(None)?;
//! let collaborators = Collaborators::from_config(&config)?;
//! let (engine, handle) = BoothEngine::new(config, collaborators);
//! engine.spawn();
//! handle.send(BoothCommand::SelectNext);
//! ```

pub mod backends;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod gallery;
pub mod lifecycle;
pub mod perception;
pub mod pipelines;
pub mod session_log;
pub mod share;
pub mod storage;
pub mod terminal;
pub mod trigger;

// Re-export commonly used types
pub use config::BoothConfig;
pub use engine::{BoothCommand, BoothEngine, BoothHandle, BoothView, Collaborators};
pub use errors::{BoothError, BoothResult};
