// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Hold-to-trigger timing
pub mod hold {
    use super::Duration;

    /// Continuous dual-predicate time required before a capture fires
    pub const REQUIRED_HOLD_MS: u64 = 1400;

    /// Sampling tick of the hold state machine
    pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(40);

    /// Tolerated predicate dropout while holding (0 = a single miss resets)
    pub const DEFAULT_GRACE_MS: u64 = 0;
}

/// Post-capture lockout
pub mod lockout {
    use super::Duration;

    /// Seconds during which no new capture can trigger
    pub const COOLDOWN_SECONDS: u8 = 3;

    /// Countdown tick
    pub const TICK: Duration = Duration::from_secs(1);
}

/// Landmark geometry and smile calibration
pub mod landmarks {
    /// Number of landmarks in a hand set
    pub const HAND_LANDMARK_COUNT: usize = 21;

    /// Index fingertip / PIP joint
    pub const INDEX_TIP: usize = 8;
    pub const INDEX_PIP: usize = 6;
    /// Middle fingertip / PIP joint
    pub const MIDDLE_TIP: usize = 12;
    pub const MIDDLE_PIP: usize = 10;
    /// Ring fingertip / PIP joint
    pub const RING_TIP: usize = 16;
    pub const RING_PIP: usize = 14;
    /// Pinky fingertip / PIP joint
    pub const PINKY_TIP: usize = 20;
    pub const PINKY_PIP: usize = 18;

    /// Face mesh mouth corners
    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;
    /// Face mesh outer cheek boundaries
    pub const CHEEK_LEFT: usize = 234;
    pub const CHEEK_RIGHT: usize = 454;

    /// Mouth/face width ratio mapped to a 0% smile
    pub const SMILE_RATIO_NEUTRAL: f32 = 0.42;
    /// Mouth/face width ratio mapped to a 100% smile
    pub const SMILE_RATIO_FULL: f32 = 0.58;
    /// Score strictly above which a face counts as smiling
    pub const SMILE_THRESHOLD: f32 = 35.0;
}

/// Render loop and overlay styling
pub mod render {
    use super::Duration;

    /// Default display cadence (~30 fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Output surface size
    pub const OUTPUT_WIDTH: u32 = 1280;
    pub const OUTPUT_HEIGHT: u32 = 720;

    /// Reticle distance from the face bounding box
    pub const RETICLE_OFFSET: i32 = 30;
    /// Reticle corner arm length
    pub const RETICLE_ARM: i32 = 20;
    /// Reticle stroke width
    pub const RETICLE_STROKE: i32 = 2;

    /// Status tag plate size, drawn above the reticle
    pub const TAG_WIDTH: u32 = 120;
    pub const TAG_HEIGHT: u32 = 18;
    /// Gap between tag plate and reticle top
    pub const TAG_GAP: i32 = 25;
    /// Tag plate opacity
    pub const TAG_ALPHA: f32 = 0.6;

    /// Overlay colour when the snapshot reports a smile (#39ff14)
    pub const COLOR_SMILING: [u8; 3] = [0x39, 0xff, 0x14];
    /// Overlay colour otherwise (#bc6ff1)
    pub const COLOR_IDLE: [u8; 3] = [0xbc, 0x6f, 0xf1];
}

/// Share upload endpoints
pub mod share {
    use super::Duration;

    /// File host upload endpoint
    pub const UPLOAD_URL: &str = "https://tmpfiles.org/api/v1/upload";

    /// View URL fragment rewritten into the direct-download form
    pub const VIEW_URL_FRAGMENT: &str = "tmpfiles.org/";
    pub const DIRECT_URL_FRAGMENT: &str = "tmpfiles.org/dl/";

    /// QR code rendering service
    pub const QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
    pub const QR_SIZE: u32 = 250;

    /// Upload request timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Camera pipeline
pub mod pipeline {
    /// Default capture device
    pub const DEFAULT_DEVICE: &str = "/dev/video0";

    /// Maximum buffers in the appsink queue
    pub const MAX_BUFFERS: u32 = 2;

    /// Frame channel depth between capture thread and engine
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Output pixel format from the GStreamer pipeline
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Seconds to wait for the pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Seconds to wait for the pipeline to reach NULL
    pub const STOP_TIMEOUT_SECS: u64 = 2;
}

/// Session log
pub mod session {
    /// Maximum entries kept in the session log
    pub const LOG_CAPACITY: usize = 10;

    /// Entries present when the booth starts
    pub const BOOT_MESSAGES: [&str; 2] = ["SYSTEM_STABLE", "AUTH_LAYER_READY"];
}

/// Application metadata
pub mod app_info {
    /// Directory name used under config/cache/picture directories
    pub const APP_DIR: &str = "gesture-booth";

    /// Config file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Get the application version (from GIT_VERSION env var set at build time)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
