// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function is a dispatcher; the handling code lives in the
//! `handlers` submodules organized by domain.
//!
//! # Handler Modules
//!
//! - `handlers::system`: Setup, permissions, session worker results, teardown
//! - `handlers::camera`: Camera/output swaps and device settings
//! - `handlers::exposure`: Exposure mode, duration, ISO and bias
//! - `handlers::capture`: Photo capture and recording
//! - `handlers::orientation`: Motion samples, UI rotation, orientation lock

use super::CameraSession;
use super::state::{Message, SessionPhase};
use super::task::Task;
use tracing::{debug, warn};

impl CameraSession {
    /// Handle one message on the UI context
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            // ===== Lifecycle =====
            Message::Setup => self.setup(),
            Message::Cancel => self.cancel(),
            Message::PermissionResolved(kind, status) => {
                self.handle_permission_resolved(kind, status)
            }
            Message::SessionStarted(result) => self.handle_session_started(result),
            Message::SessionStopped => {
                debug!(phase = ?self.phase, "Capture session stopped");
                Task::none()
            }

            // ===== Camera Control =====
            Message::ChangeCamera(position) => self.change_camera(position),
            Message::ChangeOutputType(output) => self.change_output_type(output),
            Message::CompleteReconfiguration(id) => self.handle_complete_reconfiguration(id),
            Message::FreezeRemoved(id) => self.handle_freeze_removed(id),
            Message::ChangeZoomFactor(factor) => {
                if let Err(e) = self.change_zoom_factor(factor) {
                    debug!(factor, error = %e, "Zoom change not applied");
                }
                Task::none()
            }
            Message::ChangeFlashMode(mode) => {
                self.change_flash_mode(mode);
                Task::none()
            }
            Message::ChangeTorchMode(mode) => {
                if let Err(e) = self.change_torch_mode(mode) {
                    warn!(?mode, error = %e, "Torch change failed");
                }
                Task::none()
            }
            Message::ChangeExposureMode(mode) => {
                if let Err(e) = self.change_exposure_mode(mode) {
                    warn!(?mode, error = %e, "Exposure mode change failed");
                }
                Task::none()
            }
            Message::ChangeExposureDuration(duration) => {
                if let Err(e) = self.change_exposure_duration(duration) {
                    warn!(?duration, error = %e, "Exposure duration change failed");
                }
                Task::none()
            }
            Message::ChangeIso(iso) => {
                if let Err(e) = self.change_iso(iso) {
                    warn!(iso, error = %e, "ISO change failed");
                }
                Task::none()
            }
            Message::ChangeExposureTargetBias(bias) => {
                if let Err(e) = self.change_exposure_target_bias(bias) {
                    warn!(bias, error = %e, "Exposure bias change failed");
                }
                Task::none()
            }
            Message::ChangeHdrMode(mode) => {
                if let Err(e) = self.change_hdr_mode(mode) {
                    warn!(?mode, error = %e, "HDR change failed");
                }
                Task::none()
            }
            Message::ChangeResolution(preset) => {
                if let Err(e) = self.change_resolution(preset) {
                    warn!(?preset, error = %e, "Resolution change failed");
                }
                Task::none()
            }
            Message::ChangeFrameRate(fps) => {
                if let Err(e) = self.change_frame_rate(fps) {
                    warn!(fps, error = %e, "Frame rate change failed");
                }
                Task::none()
            }
            Message::ChangeMirrorOutput(mirror) => {
                self.change_mirror_output(mirror);
                Task::none()
            }
            Message::ChangeGridVisibility(visible) => self.change_grid_visibility(visible),
            Message::ChangeCameraFilters(filters) => {
                self.change_camera_filters(filters);
                Task::none()
            }
            Message::SetCameraFocus(point) => self.set_camera_focus(point),
            Message::LockOrientation(locked) => {
                self.lock_orientation(locked);
                Task::none()
            }

            // ===== Capture Operations =====
            Message::CaptureOutput => self.capture_output(),
            Message::PhotoCaptured(result) => self.handle_photo_captured(result),
            Message::RecordingTick(generation) => self.handle_recording_tick(generation),
            Message::RecordingFinished(generation, result) => {
                self.handle_recording_finished(generation, result)
            }

            // ===== Orientation =====
            Message::MotionSample(sample) => self.handle_motion_sample(sample),
            Message::DeviceRotationChanged(rotation) => {
                self.handle_rotation_changed(rotation);
                Task::none()
            }

            // ===== Animation =====
            Message::ApplyViewEffect(effect) => {
                if self.phase == SessionPhase::Cancelled {
                    debug!(?effect, "Session cancelled, dropping view effect");
                } else {
                    self.collaborators.surface.apply(&effect);
                }
                Task::none()
            }
        }
    }
}
