// SPDX-License-Identifier: GPL-3.0-only

//! Session-wide constants

/// Zoom limits
pub mod zoom {
    /// Upper bound applied on top of the device-reported maximum zoom
    pub const MAX_ZOOM_FACTOR: f64 = 3.0;
}

/// Frame rate limits
pub mod frame_rate {
    /// Lowest frame rate the session accepts
    pub const MIN_FRAME_RATE: u32 = 15;

    /// Frame rate used when no preference is stored
    pub const DEFAULT_FRAME_RATE: u32 = 30;
}

/// Accelerometer thresholds
pub mod orientation {
    /// Gravity component (in g) an axis must reach before the logical
    /// orientation changes
    pub const GRAVITY_THRESHOLD: f64 = 0.75;

    /// Default accelerometer sampling interval in milliseconds
    pub const DEFAULT_MOTION_INTERVAL_MS: u64 = 100;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Freeze lead time before an output-type swap
    pub const BLUR_LEAD_TIME: Duration = Duration::from_millis(150);

    /// Freeze lead time before a camera-position swap (covers the flip)
    pub const BLUR_FLIP_LEAD_TIME: Duration = Duration::from_millis(300);

    /// Interval of the recording duration timer
    pub const RECORDING_TICK: Duration = Duration::from_secs(1);

    /// How long the session worker waits for a command before re-checking its stop signal
    pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);
}

/// Animation durations
pub mod animation {
    use std::time::Duration;

    /// Blur fade-in when a freeze starts
    pub const FREEZE_FADE_IN: Duration = Duration::from_millis(100);

    /// Blur fade-out once the swap finished
    pub const UNFREEZE_FADE_OUT: Duration = Duration::from_millis(200);

    /// Half of the camera flip (the preview turns edge-on, then back)
    pub const FLIP_HALF: Duration = Duration::from_millis(150);

    /// White flash fade after a still capture
    pub const CAPTURE_FLASH_FADE: Duration = Duration::from_millis(250);

    /// Focus ring appear/shrink duration
    pub const FOCUS_RING_APPEAR: Duration = Duration::from_millis(200);

    /// How long the focus ring stays visible before fading out
    pub const FOCUS_RING_VISIBLE: Duration = Duration::from_millis(600);

    /// Focus ring fade-out duration
    pub const FOCUS_RING_FADE: Duration = Duration::from_millis(250);

    /// Focus ring scale when it first appears
    pub const FOCUS_RING_INITIAL_SCALE: f32 = 1.4;

    /// Grid overlay fade duration
    pub const GRID_FADE: Duration = Duration::from_millis(320);
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_lead_covers_plain_blur() {
        assert!(timing::BLUR_FLIP_LEAD_TIME >= timing::BLUR_LEAD_TIME);
        assert!(timing::BLUR_FLIP_LEAD_TIME >= animation::FLIP_HALF * 2);
    }

    #[test]
    fn test_version_is_set() {
        assert!(!app_info::version().is_empty());
    }
}
