// SPDX-License-Identifier: GPL-3.0-only

//! Device orientation tracking
//!
//! Two signals are tracked separately:
//! - the logical orientation, from accelerometer thresholds with a dead zone
//!   in which the previous value is kept
//! - the frame tag, from the UI-reported rotation, the camera position and
//!   the mirror flag

use super::state::DeviceOrientation;
use crate::backends::camera::{CameraPosition, FrameOrientation};
use crate::backends::motion::Acceleration;
use crate::backends::surface::UiRotation;
use crate::constants::orientation::GRAVITY_THRESHOLD;
use tracing::debug;

/// Derives logical orientation and frame tags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrientationTracker {
    logical: DeviceOrientation,
    frame_tag: FrameOrientation,
    locked: bool,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logical(&self) -> DeviceOrientation {
        self.logical
    }

    pub fn frame_tag(&self) -> FrameOrientation {
        self.frame_tag
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Treat the UI rotation as portrait for frame tagging while locked
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Orientation suggested by a sample; `None` inside the dead zone
    pub fn candidate(sample: &Acceleration) -> Option<DeviceOrientation> {
        if sample.x >= GRAVITY_THRESHOLD {
            Some(DeviceOrientation::LandscapeLeft)
        } else if sample.x <= -GRAVITY_THRESHOLD {
            Some(DeviceOrientation::LandscapeRight)
        } else if sample.y <= -GRAVITY_THRESHOLD {
            Some(DeviceOrientation::Portrait)
        } else if sample.y >= GRAVITY_THRESHOLD {
            Some(DeviceOrientation::PortraitUpsideDown)
        } else {
            None
        }
    }

    /// Feed an accelerometer sample; returns true when the logical orientation changed
    pub fn update_logical(&mut self, sample: &Acceleration) -> bool {
        match Self::candidate(sample) {
            Some(orientation) if orientation != self.logical => {
                debug!(from = ?self.logical, to = ?orientation, "Logical orientation changed");
                self.logical = orientation;
                true
            }
            _ => false,
        }
    }

    /// Frame tag for a rotation; `None` for upside-down, which keeps the prior tag
    pub fn frame_tag_for(
        position: CameraPosition,
        rotation: UiRotation,
        mirror: bool,
    ) -> Option<FrameOrientation> {
        use FrameOrientation::*;

        let tag = match (position, rotation) {
            (_, UiRotation::PortraitUpsideDown) => return None,

            (CameraPosition::Back, UiRotation::LandscapeLeft) => {
                if mirror { UpMirrored } else { Up }
            }
            (CameraPosition::Back, UiRotation::LandscapeRight) => {
                if mirror { DownMirrored } else { Down }
            }
            (CameraPosition::Back, _) => {
                if mirror { LeftMirrored } else { Right }
            }

            (CameraPosition::Front, UiRotation::LandscapeLeft) => {
                if mirror { Down } else { DownMirrored }
            }
            (CameraPosition::Front, UiRotation::LandscapeRight) => {
                if mirror { Up } else { UpMirrored }
            }
            (CameraPosition::Front, _) => {
                if mirror { Right } else { LeftMirrored }
            }
        };
        Some(tag)
    }

    /// Recompute the frame tag from the UI rotation
    pub fn update_frame_tag(
        &mut self,
        position: CameraPosition,
        rotation: UiRotation,
        mirror: bool,
    ) -> FrameOrientation {
        let rotation = if self.locked {
            UiRotation::Portrait
        } else {
            rotation
        };
        if let Some(tag) = Self::frame_tag_for(position, rotation, mirror) {
            self.frame_tag = tag;
        }
        self.frame_tag
    }

    /// Whether the logical orientation disagrees with the UI rotation
    ///
    /// Logical landscape-left corresponds to UI landscape-right and vice versa.
    pub fn user_blocked_rotation(&self, rotation: UiRotation) -> bool {
        if self.locked {
            return false;
        }
        let matches = matches!(
            (self.logical, rotation),
            (DeviceOrientation::Portrait, UiRotation::Portrait)
                | (DeviceOrientation::PortraitUpsideDown, UiRotation::PortraitUpsideDown)
                | (DeviceOrientation::LandscapeLeft, UiRotation::LandscapeRight)
                | (DeviceOrientation::LandscapeRight, UiRotation::LandscapeLeft)
        );
        !matches
    }

    /// Back to portrait, default tag, unlocked
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64) -> Acceleration {
        Acceleration::new(x, y, 0.0)
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(
            OrientationTracker::candidate(&sample(0.75, 0.0)),
            Some(DeviceOrientation::LandscapeLeft)
        );
        assert_eq!(
            OrientationTracker::candidate(&sample(-0.9, 0.0)),
            Some(DeviceOrientation::LandscapeRight)
        );
        assert_eq!(
            OrientationTracker::candidate(&sample(0.0, -0.75)),
            Some(DeviceOrientation::Portrait)
        );
        assert_eq!(
            OrientationTracker::candidate(&sample(0.0, 0.8)),
            Some(DeviceOrientation::PortraitUpsideDown)
        );
        assert_eq!(OrientationTracker::candidate(&sample(0.5, -0.5)), None);
    }

    #[test]
    fn test_dead_zone_keeps_previous_orientation() {
        let mut tracker = OrientationTracker::new();
        assert!(tracker.update_logical(&sample(1.0, 0.0)));
        assert_eq!(tracker.logical(), DeviceOrientation::LandscapeLeft);

        // Tilting through the diagonal does not flip back
        assert!(!tracker.update_logical(&sample(0.6, -0.6)));
        assert!(!tracker.update_logical(&sample(0.2, -0.3)));
        assert_eq!(tracker.logical(), DeviceOrientation::LandscapeLeft);

        assert!(tracker.update_logical(&sample(0.1, -0.95)));
        assert_eq!(tracker.logical(), DeviceOrientation::Portrait);
    }

    #[test]
    fn test_back_camera_table() {
        use FrameOrientation::*;
        let cases = [
            (UiRotation::Portrait, false, Right),
            (UiRotation::Portrait, true, LeftMirrored),
            (UiRotation::LandscapeLeft, false, Up),
            (UiRotation::LandscapeLeft, true, UpMirrored),
            (UiRotation::LandscapeRight, false, Down),
            (UiRotation::LandscapeRight, true, DownMirrored),
            (UiRotation::FaceUp, false, Right),
            (UiRotation::Unknown, true, LeftMirrored),
        ];
        for (rotation, mirror, expected) in cases {
            assert_eq!(
                OrientationTracker::frame_tag_for(CameraPosition::Back, rotation, mirror),
                Some(expected),
                "{:?} mirror={}",
                rotation,
                mirror
            );
        }
    }

    #[test]
    fn test_front_camera_table() {
        use FrameOrientation::*;
        let cases = [
            (UiRotation::Portrait, false, LeftMirrored),
            (UiRotation::Portrait, true, Right),
            (UiRotation::LandscapeLeft, false, DownMirrored),
            (UiRotation::LandscapeLeft, true, Down),
            (UiRotation::LandscapeRight, false, UpMirrored),
            (UiRotation::LandscapeRight, true, Up),
            (UiRotation::FaceDown, false, LeftMirrored),
        ];
        for (rotation, mirror, expected) in cases {
            assert_eq!(
                OrientationTracker::frame_tag_for(CameraPosition::Front, rotation, mirror),
                Some(expected),
                "{:?} mirror={}",
                rotation,
                mirror
            );
        }
    }

    #[test]
    fn test_upside_down_keeps_prior_tag() {
        let mut tracker = OrientationTracker::new();
        let tag = tracker.update_frame_tag(CameraPosition::Back, UiRotation::LandscapeLeft, false);
        assert_eq!(tag, FrameOrientation::Up);

        let tag =
            tracker.update_frame_tag(CameraPosition::Back, UiRotation::PortraitUpsideDown, false);
        assert_eq!(tag, FrameOrientation::Up);
    }

    #[test]
    fn test_lock_forces_portrait_tag() {
        let mut tracker = OrientationTracker::new();
        tracker.set_locked(true);

        let tag = tracker.update_frame_tag(CameraPosition::Back, UiRotation::LandscapeRight, false);
        assert_eq!(tag, FrameOrientation::Right);
    }

    #[test]
    fn test_user_blocked_rotation() {
        let mut tracker = OrientationTracker::new();
        assert!(!tracker.user_blocked_rotation(UiRotation::Portrait));

        tracker.update_logical(&sample(1.0, 0.0));
        // Accelerometer says landscape, UI stayed portrait
        assert!(tracker.user_blocked_rotation(UiRotation::Portrait));
        assert!(!tracker.user_blocked_rotation(UiRotation::LandscapeRight));
        assert!(tracker.user_blocked_rotation(UiRotation::LandscapeLeft));

        tracker.set_locked(true);
        assert!(!tracker.user_blocked_rotation(UiRotation::Portrait));
    }
}
