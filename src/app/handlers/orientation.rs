// SPDX-License-Identifier: GPL-3.0-only

//! Orientation handlers

use crate::app::CameraSession;
use crate::app::state::SessionPhase;
use crate::app::task::Task;
use crate::backends::motion::{Acceleration, SensorError};
use crate::backends::surface::UiRotation;
use tracing::{debug, trace};

impl CameraSession {
    pub(crate) fn handle_motion_sample(&mut self, sample: Result<Acceleration, SensorError>) -> Task {
        if self.phase == SessionPhase::Cancelled {
            return Task::none();
        }
        match sample {
            Ok(sample) => {
                trace!(x = sample.x, y = sample.y, "Motion sample");
                if self.tracker.update_logical(&sample) {
                    self.attributes.device_orientation = self.tracker.logical();
                }
                self.refresh_orientation(self.collaborators.surface.device_rotation());
            }
            Err(e) => debug!(error = %e, "Motion sample dropped"),
        }
        Task::none()
    }

    pub(crate) fn handle_rotation_changed(&mut self, rotation: UiRotation) {
        if self.phase == SessionPhase::Cancelled {
            return;
        }
        debug!(?rotation, "UI rotation changed");
        self.refresh_orientation(rotation);
    }

    /// Keep frame tags at portrait regardless of the UI rotation
    pub fn lock_orientation(&mut self, locked: bool) {
        self.tracker.set_locked(locked);
        self.refresh_orientation(self.collaborators.surface.device_rotation());
    }

    /// Recompute the frame tag and the blocked-rotation flag
    pub(crate) fn refresh_orientation(&mut self, rotation: UiRotation) {
        let tag = self.tracker.update_frame_tag(
            self.attributes.camera_position,
            rotation,
            self.attributes.mirror_output,
        );
        self.pipeline.set_orientation(tag);
        self.attributes.user_blocked_rotation = self.tracker.user_blocked_rotation(rotation);
    }
}
