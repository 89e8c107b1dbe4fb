// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Camera and output swaps are masked by a freeze transition: the current
//! frame is frozen and blurred, the swap happens once the lead time elapsed,
//! and the blur fades out afterwards. The swap counts as in flight until the
//! freeze view is removed, so only one can run at a time.

use crate::app::animation::AnimationSequencer;
use crate::app::state::{Message, Reconfiguration, SessionPhase};
use crate::app::task::Task;
use crate::app::{CameraSession, PendingReconfiguration};
use crate::backends::camera::{
    CameraPosition, CaptureDevice, ExposureSettings, FlashMode, FocusPoint, HdrMode, OutputType,
    ResolutionPreset, TorchMode,
};
use crate::backends::surface::ViewEffect;
use crate::constants::frame_rate::MIN_FRAME_RATE;
use crate::errors::{ConfigResult, ConfigurationError, SessionError, SessionResult};
use crate::pipelines::{FilterType, TransitionKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CameraSession {
    // =========================================================================
    // Camera / output swaps
    // =========================================================================

    /// Swap to another camera behind a blur-and-flip transition
    pub fn change_camera(&mut self, position: CameraPosition) -> Task {
        self.request_reconfiguration(Reconfiguration::Camera(position))
    }

    /// Swap the attached output behind a blur transition
    pub fn change_output_type(&mut self, output: OutputType) -> Task {
        self.request_reconfiguration(Reconfiguration::Output(output))
    }

    fn request_reconfiguration(&mut self, change: Reconfiguration) -> Task {
        match self.phase {
            SessionPhase::Uninitialized | SessionPhase::Cancelled => {
                // Nothing is wired yet; the next setup uses the new value
                match change {
                    Reconfiguration::Camera(position) => {
                        self.attributes.camera_position = position
                    }
                    Reconfiguration::Output(output) => self.attributes.output_type = output,
                }
                return Task::none();
            }
            SessionPhase::Configuring => {
                debug!(?change, "Session still configuring, dropping reconfiguration");
                return Task::none();
            }
            SessionPhase::Running => {}
        }

        if self.capture.is_changing() {
            debug!(?change, "Reconfiguration already in flight, dropping");
            return Task::none();
        }

        let unchanged = match change {
            Reconfiguration::Camera(position) => position == self.attributes.camera_position,
            Reconfiguration::Output(output) => output == self.attributes.output_type,
        };
        if unchanged {
            return Task::none();
        }

        if self.capture.is_recording() {
            debug!(?change, "Recording in progress, dropping reconfiguration");
            return Task::none();
        }

        if let Reconfiguration::Camera(position) = change {
            let available = self
                .devices
                .as_ref()
                .is_some_and(|devices| devices.camera(position).is_some());
            if !available {
                warn!(%position, "No camera at requested position");
                return Task::none();
            }
        }

        let kind = match change {
            Reconfiguration::Camera(_) => TransitionKind::BlurFlip,
            Reconfiguration::Output(_) => TransitionKind::Blur,
        };
        let snapshot = self.pipeline.capture_snapshot();
        if !self.capture.begin_freeze(kind, snapshot.clone()) {
            return Task::none();
        }

        self.reconfiguration_counter += 1;
        let id = self.reconfiguration_counter;
        self.pending = Some(PendingReconfiguration { id, change });
        info!(?change, ?kind, "Reconfiguration started");

        Task::batch([
            self.schedule(AnimationSequencer::freeze(kind, snapshot)),
            Task::delay(
                AnimationSequencer::lead_time(kind),
                Message::CompleteReconfiguration(id),
            ),
        ])
    }

    pub(crate) fn handle_complete_reconfiguration(&mut self, id: u64) -> Task {
        let Some(pending) = self.pending.take_if(|pending| pending.id == id) else {
            debug!(id, "Stale reconfiguration, ignoring");
            return Task::none();
        };

        let result = match pending.change {
            Reconfiguration::Camera(position) => self.swap_camera(position),
            Reconfiguration::Output(output) => self.swap_output(output),
        };
        if let Err(e) = result {
            warn!(change = ?pending.change, error = %e, "Reconfiguration failed");
            self.attributes.error = Some(e);
        }

        self.reset_torch();
        self.refresh_orientation(self.collaborators.surface.device_rotation());
        info!(change = ?pending.change, "Reconfiguration applied, fading out");
        Task::batch([
            self.schedule(AnimationSequencer::unfreeze()),
            Task::delay(
                AnimationSequencer::unfreeze_duration(),
                Message::FreezeRemoved(id),
            ),
        ])
    }

    /// Remove the freeze view of reconfiguration `id` and end its transition
    pub(crate) fn handle_freeze_removed(&mut self, id: u64) -> Task {
        let current = self.pending.is_none() && id == self.reconfiguration_counter;
        if !current || !self.capture.is_changing() {
            debug!(id, "Stale freeze removal, ignoring");
            return Task::none();
        }
        self.collaborators.surface.apply(&ViewEffect::RemoveFreeze);
        self.capture.end_freeze();
        info!(id, "Reconfiguration finished");
        Task::none()
    }

    fn swap_camera(&mut self, position: CameraPosition) -> SessionResult<()> {
        let provider = Arc::clone(&self.collaborators.provider);
        let new_camera = self
            .devices
            .as_ref()
            .ok_or_else(|| SessionError::DeviceUnavailable(position.to_string()))?
            .require_camera(position)?
            .clone();
        let Some(wiring) = self.wiring.as_mut() else {
            return Err(SessionError::DeviceUnavailable(position.to_string()));
        };

        let old_camera = wiring.camera.clone();
        provider.remove_input(&old_camera);
        if let Err(e) = provider.add_input(new_camera.id()) {
            if let Err(restore) = provider.add_input(&old_camera) {
                warn!(device = %old_camera, error = %restore, "Previous camera could not be restored");
            }
            return Err(SessionError::InputAttachFailed(e.to_string()));
        }
        wiring.camera = new_camera.id().clone();

        self.attributes.camera_position = position;
        // Exposure values are device specific
        self.attributes.exposure = ExposureSettings::default();
        self.apply_device_ranges(&new_camera);
        Ok(())
    }

    /// Clamp zoom and frame rate into the ranges of `camera` and apply them
    ///
    /// The snapshot takes the clamped values even when the device rejects
    /// them, so it never holds a value outside the active camera's ranges.
    pub(crate) fn apply_device_ranges(&mut self, camera: &CaptureDevice) {
        let zoom = camera.capabilities.clamp_zoom(self.attributes.zoom_factor);
        if let Err(e) = self.configurator.apply_zoom(camera, zoom) {
            warn!(device = %camera.id(), zoom, error = %e, "Zoom not applied");
        }
        self.attributes.zoom_factor = zoom;

        let fps = self
            .attributes
            .frame_rate
            .max(MIN_FRAME_RATE)
            .min(camera.capabilities.max_frame_rate());
        if let Err(e) = self.configurator.apply_frame_rate(camera, fps) {
            warn!(device = %camera.id(), fps, error = %e, "Frame rate not applied");
        }
        self.attributes.frame_rate = fps;
    }

    fn swap_output(&mut self, output: OutputType) -> SessionResult<()> {
        let provider = Arc::clone(&self.collaborators.provider);
        let Some(wiring) = self.wiring.as_mut() else {
            return Err(SessionError::OutputAttachFailed(output.to_string()));
        };

        let old_output = wiring.output;
        provider.remove_output(old_output);
        if let Err(e) = provider.add_output(output) {
            if let Err(restore) = provider.add_output(old_output) {
                warn!(output = %old_output, error = %restore, "Previous output could not be restored");
            }
            return Err(SessionError::OutputAttachFailed(e.to_string()));
        }
        wiring.output = output;
        self.attributes.output_type = output;
        Ok(())
    }

    /// The torch never survives a swap
    fn reset_torch(&mut self) {
        self.attributes.torch_mode = TorchMode::Off;
        let Ok(device) = self.active_device() else {
            return;
        };
        if let Err(e) = self.configurator.apply_torch(device, TorchMode::Off) {
            warn!(error = %e, "Torch not reset");
        }
    }

    // =========================================================================
    // Device settings
    // =========================================================================

    /// Clamp and apply a zoom factor; rejected while a swap is in flight
    pub fn change_zoom_factor(&mut self, factor: f64) -> ConfigResult<f64> {
        if self.capture.is_changing() {
            return Err(ConfigurationError::TransitionInProgress);
        }
        let applied = self.configurator.apply_zoom(self.active_device()?, factor)?;
        self.attributes.zoom_factor = applied;
        Ok(applied)
    }

    /// Apply a frame rate within `[15, device max]`; the snapshot keeps its
    /// previous value on error
    pub fn change_frame_rate(&mut self, fps: u32) -> ConfigResult<u32> {
        let applied = self.configurator.apply_frame_rate(self.active_device()?, fps)?;
        self.attributes.frame_rate = applied;
        Ok(applied)
    }

    /// Flash mode for subsequent captures; `None` when the camera has no flash
    pub fn change_flash_mode(&mut self, mode: FlashMode) -> Option<FlashMode> {
        let device = self.active_device().ok()?;
        let applied = self.configurator.apply_flash(device, mode)?;
        self.attributes.flash_mode = applied;
        Some(applied)
    }

    pub fn change_torch_mode(&mut self, mode: TorchMode) -> ConfigResult<Option<TorchMode>> {
        let applied = self.configurator.apply_torch(self.active_device()?, mode)?;
        if let Some(mode) = applied {
            self.attributes.torch_mode = mode;
        }
        Ok(applied)
    }

    pub fn change_hdr_mode(&mut self, mode: HdrMode) -> ConfigResult<Option<HdrMode>> {
        let applied = self.configurator.apply_hdr(self.active_device()?, mode)?;
        if let Some(mode) = applied {
            self.attributes.hdr_mode = mode;
        }
        Ok(applied)
    }

    /// Change the session preset; before setup only the snapshot changes
    ///
    /// Unlike camera and output swaps, a preset change is not masked by a freeze.
    pub fn change_resolution(&mut self, preset: ResolutionPreset) -> ConfigResult<ResolutionPreset> {
        if self.phase == SessionPhase::Running {
            self.collaborators.provider.set_resolution(preset)?;
        }
        self.attributes.resolution = preset;
        Ok(preset)
    }

    pub fn change_mirror_output(&mut self, mirror: bool) {
        self.attributes.mirror_output = mirror;
        self.refresh_orientation(self.collaborators.surface.device_rotation());
    }

    pub fn change_grid_visibility(&mut self, visible: bool) -> Task {
        if self.attributes.grid_visible == visible {
            return Task::none();
        }
        self.attributes.grid_visible = visible;
        self.schedule(AnimationSequencer::grid_fade(visible))
    }

    /// Replace the preview filter chain
    pub fn change_camera_filters(&mut self, filters: Vec<FilterType>) {
        self.pipeline.set_filters(filters.clone());
        self.attributes.filters = filters;
    }

    /// Point focus and exposure at `point` and show the focus ring
    pub fn set_camera_focus(&mut self, point: FocusPoint) -> Task {
        let result = match self.active_device() {
            Ok(device) => self.configurator.apply_focus(device, point),
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(point)) => self.schedule(AnimationSequencer::focus_ring(point)),
            Ok(None) => Task::none(),
            Err(e) => {
                debug!(error = %e, "Focus not applied");
                Task::none()
            }
        }
    }
}
