// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle handlers
//!
//! Setup runs in three steps: permission checks (possibly prompting), device
//! wiring on the UI context, and the blocking session start on the session
//! worker. The phase only becomes `Running` once the worker reports success.

use crate::app::state::{Attributes, Message, SessionPhase};
use crate::app::task::Task;
use crate::app::{CameraSession, Wiring};
use crate::backends::camera::{BackendResult, CaptureDevice, SessionEvent, SessionWorker};
use crate::backends::permissions::{PermissionKind, PermissionStatus};
use crate::errors::{SessionError, SessionResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl CameraSession {
    // =========================================================================
    // Setup
    // =========================================================================

    /// Check permissions and start configuring the capture session
    pub fn setup(&mut self) -> Task {
        if matches!(self.phase, SessionPhase::Configuring | SessionPhase::Running) {
            warn!(phase = ?self.phase, "Setup requested twice, ignoring");
            return Task::none();
        }

        info!(camera = %self.attributes.camera_position, output = %self.attributes.output_type, "Setting up capture session");
        self.phase = SessionPhase::Configuring;
        self.attributes.error = None;
        self.setup = Default::default();

        let mut tasks = Vec::new();
        for kind in [PermissionKind::Camera, PermissionKind::Microphone] {
            match self.collaborators.permissions.status(kind) {
                PermissionStatus::Granted => self.record_permission(kind, true),
                PermissionStatus::Denied => self.record_permission(kind, false),
                PermissionStatus::Undetermined => {
                    debug!(%kind, "Requesting permission");
                    let request = self.collaborators.permissions.request(kind);
                    tasks.push(Task::perform(async move {
                        Message::PermissionResolved(kind, request.await)
                    }));
                }
            }
        }

        tasks.push(self.advance_setup());
        Task::batch(tasks)
    }

    pub(crate) fn handle_permission_resolved(
        &mut self,
        kind: PermissionKind,
        status: PermissionStatus,
    ) -> Task {
        if self.phase != SessionPhase::Configuring {
            debug!(%kind, ?status, phase = ?self.phase, "Late permission answer, ignoring");
            return Task::none();
        }
        info!(%kind, ?status, "Permission resolved");
        self.record_permission(kind, status == PermissionStatus::Granted);
        self.advance_setup()
    }

    fn record_permission(&mut self, kind: PermissionKind, granted: bool) {
        match kind {
            PermissionKind::Camera => self.setup.camera = Some(granted),
            PermissionKind::Microphone => self.setup.microphone = Some(granted),
        }
    }

    /// Continue once both permissions are known
    fn advance_setup(&mut self) -> Task {
        if self.setup.camera == Some(false) {
            return self.fail_setup(SessionError::PermissionDenied {
                kind: PermissionKind::Camera,
            });
        }
        let (Some(true), Some(microphone)) = (self.setup.camera, self.setup.microphone) else {
            return Task::none();
        };
        if self.setup.wired {
            return Task::none();
        }

        if !microphone {
            // Video is still possible, just without audio
            warn!("Microphone permission denied, recording without audio");
            self.attributes.error = Some(SessionError::PermissionDenied {
                kind: PermissionKind::Microphone,
            });
        }

        match self.wire_session(microphone) {
            Ok(()) => {
                self.setup.wired = true;
                Task::none()
            }
            Err(e) => self.fail_setup(e),
        }
    }

    /// Resolve devices, attach inputs and outputs, start the frame path
    fn wire_session(&mut self, with_audio: bool) -> SessionResult<()> {
        let provider = Arc::clone(&self.collaborators.provider);
        let devices = self.registry.resolve_devices()?;
        let camera = devices.require_camera(self.attributes.camera_position)?.clone();

        if let Err(e) = provider.set_resolution(self.attributes.resolution) {
            warn!(preset = ?self.attributes.resolution, error = %e, "Resolution preset rejected");
        }

        provider
            .add_input(camera.id())
            .map_err(|e| SessionError::InputAttachFailed(e.to_string()))?;

        let microphone = match (&devices.microphone, with_audio) {
            (Some(mic), true) => match provider.add_input(mic.id()) {
                Ok(()) => Some(mic.id().clone()),
                Err(e) => {
                    warn!(device = %mic.id(), error = %e, "Audio input rejected, recording without audio");
                    None
                }
            },
            _ => None,
        };

        let output = self.attributes.output_type;
        if let Err(e) = provider.add_output(output) {
            provider.remove_input(camera.id());
            if let Some(mic) = &microphone {
                provider.remove_input(mic);
            }
            return Err(SessionError::OutputAttachFailed(e.to_string()));
        }

        self.wiring = Some(Wiring {
            camera: camera.id().clone(),
            microphone,
            output,
        });
        self.devices = Some(devices);
        info!(device = %camera.id(), name = camera.name(), %output, "Capture session wired");

        self.apply_initial_settings(&camera);

        self.pipeline.set_filters(self.attributes.filters.clone());
        self.refresh_orientation(self.collaborators.surface.device_rotation());
        self.pipeline.start_rendering();
        provider.set_frame_handler(Some(self.pipeline.frame_handler()));

        let mailbox = self.mailbox.clone();
        if let Err(e) = self.collaborators.motion.start_updates(
            self.config.motion_interval(),
            Arc::new(move |sample| mailbox.post(Message::MotionSample(sample))),
        ) {
            warn!(error = %e, "Motion updates unavailable, orientation follows the UI only");
        }

        let mailbox = self.mailbox.clone();
        let worker = SessionWorker::spawn(
            provider,
            Arc::new(move |event| {
                mailbox.post(match event {
                    SessionEvent::Started(result) => Message::SessionStarted(result),
                    SessionEvent::Stopped => Message::SessionStopped,
                })
            }),
        );
        worker.start_session();
        self.worker = Some(worker);
        Ok(())
    }

    /// Zoom, frame rate and HDR from the snapshot, clamped to the device
    fn apply_initial_settings(&mut self, camera: &CaptureDevice) {
        self.apply_device_ranges(camera);

        if let Err(e) = self.configurator.apply_hdr(camera, self.attributes.hdr_mode) {
            warn!(error = %e, "Initial HDR mode not applied");
        }
    }

    pub(crate) fn handle_session_started(&mut self, result: BackendResult<()>) -> Task {
        if self.phase != SessionPhase::Configuring {
            debug!(phase = ?self.phase, "Session start reported outside setup, ignoring");
            return Task::none();
        }
        match result {
            Ok(()) => {
                self.phase = SessionPhase::Running;
                info!("Capture session running");
                Task::none()
            }
            Err(e) => self.fail_setup(SessionError::SessionStartFailed(e.to_string())),
        }
    }

    /// Undo wiring, surface `error` and return to `Uninitialized`
    fn fail_setup(&mut self, error: SessionError) -> Task {
        error!(%error, "Capture session setup failed");
        self.teardown();
        self.phase = SessionPhase::Uninitialized;
        self.attributes.error = Some(error);
        Task::none()
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop everything and release the renderer and surface
    ///
    /// Idempotent: cancelling a cancelled session does nothing. The snapshot
    /// returns to its initial configuration and `setup` may start over.
    pub fn cancel(&mut self) -> Task {
        if self.phase == SessionPhase::Cancelled {
            debug!("Session already cancelled");
            return Task::none();
        }

        info!(phase = ?self.phase, "Cancelling capture session");
        self.teardown();
        self.collaborators.renderer.release();
        self.collaborators.surface.release();
        self.attributes = Attributes::from_config(&self.config);
        self.phase = SessionPhase::Cancelled;
        Task::none()
    }

    fn teardown(&mut self) {
        let provider = Arc::clone(&self.collaborators.provider);

        self.collaborators.motion.stop_updates();
        // Stops an active recording before the session goes away
        self.capture.reset();

        if let Some(worker) = self.worker.take() {
            worker.stop_session();
            worker.shutdown();
        }

        provider.set_frame_handler(None);
        self.pipeline.reset();

        if let Some(wiring) = self.wiring.take() {
            provider.remove_output(wiring.output);
            provider.remove_input(&wiring.camera);
            if let Some(mic) = &wiring.microphone {
                provider.remove_input(mic);
            }
        }

        self.devices = None;
        self.pending = None;
        self.setup = Default::default();
        self.tracker.reset();
    }
}
