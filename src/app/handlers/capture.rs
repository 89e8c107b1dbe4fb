// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles photo capture, video recording and the recording timer. Hardware
//! completions arrive as messages posted from the provider's threads.

use crate::app::CameraSession;
use crate::app::animation::AnimationSequencer;
use crate::app::state::{Message, SessionPhase};
use crate::app::task::Task;
use crate::backends::camera::{BackendResult, CapturedMedia, OutputType};
use crate::constants::timing::RECORDING_TICK;
use crate::errors::{CaptureError, SessionError};
use crate::pipelines::{CaptureCoordinator, RecordingToggle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

impl CameraSession {
    /// Take a photo or toggle recording, depending on the attached output
    pub fn capture_output(&mut self) -> Task {
        if self.phase != SessionPhase::Running {
            debug!(phase = ?self.phase, "Capture requested while not running");
            return Task::none();
        }
        if self.capture.is_changing() {
            debug!("Capture requested during reconfiguration, ignoring");
            return Task::none();
        }

        match self.attributes.output_type {
            OutputType::Photo => self.capture_photo(),
            OutputType::Video => self.toggle_recording(),
        }
    }

    fn capture_photo(&mut self) -> Task {
        let has_flash = self
            .active_device()
            .is_ok_and(|device| device.capabilities.has_flash);
        let settings = CaptureCoordinator::photo_settings(
            self.attributes.flash_mode,
            has_flash,
            self.pipeline.orientation(),
            self.attributes.mirror_output,
        );

        let mailbox = self.mailbox.clone();
        self.capture.capture_photo(
            settings,
            Box::new(move |result| {
                mailbox.post(Message::PhotoCaptured(result.map(CapturedMedia::Image)));
            }),
        );
        self.schedule(AnimationSequencer::capture_flash())
    }

    fn toggle_recording(&mut self) -> Task {
        let freeze_frame = self.pipeline.capture_snapshot();
        let mailbox = self.mailbox.clone();
        let toggled = self.capture.toggle_recording(
            freeze_frame,
            Box::new(move |generation, result| {
                mailbox.post(Message::RecordingFinished(generation, result))
            }),
        );

        match toggled {
            Ok(RecordingToggle::Started { generation, path }) => {
                info!(path = %path.display(), "Recording");
                self.attributes.is_recording = true;
                self.attributes.recording_time = Duration::ZERO;
                Task::delay(RECORDING_TICK, Message::RecordingTick(generation))
            }
            Ok(RecordingToggle::Stopped { placeholder }) => {
                // Shown until the finished movie arrives
                if placeholder.is_some() {
                    self.attributes.captured_media = placeholder;
                }
                self.attributes.is_recording = false;
                Task::none()
            }
            Err(e) => {
                error!(error = %e, "Recording toggle failed");
                self.attributes.error = Some(SessionError::Capture(e));
                Task::none()
            }
        }
    }

    pub(crate) fn handle_photo_captured(&mut self, result: BackendResult<CapturedMedia>) -> Task {
        if self.phase == SessionPhase::Cancelled {
            debug!("Photo delivered after cancel, dropping");
            return Task::none();
        }
        self.capture.photo_finished();
        debug!(in_flight = self.capture.photos_in_flight(), "Photo delivered");
        match result {
            Ok(media) => {
                info!(?media, "Photo captured");
                self.attributes.captured_media = Some(media);
            }
            Err(e) => {
                error!(error = %e, "Photo capture failed");
                self.attributes.error = Some(SessionError::Capture(CaptureError::Failed(e.to_string())));
            }
        }
        Task::none()
    }

    pub(crate) fn handle_recording_tick(&mut self, generation: u64) -> Task {
        if !self.capture.accepts_tick(generation) {
            return Task::none();
        }
        self.attributes.recording_time += RECORDING_TICK;
        Task::delay(RECORDING_TICK, Message::RecordingTick(generation))
    }

    pub(crate) fn handle_recording_finished(
        &mut self,
        generation: u64,
        result: BackendResult<PathBuf>,
    ) -> Task {
        if self.phase == SessionPhase::Cancelled {
            debug!("Recording finalized after cancel, dropping");
            return Task::none();
        }
        // Only the recording still in progress can be ended by the hardware
        if self.capture.is_active_recording(generation) {
            self.capture.recording_ended();
            self.attributes.is_recording = false;
        }
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Recording saved");
                self.attributes.captured_media = Some(CapturedMedia::Video(path));
            }
            Err(e) => {
                error!(error = %e, "Recording failed");
                self.attributes.error = Some(SessionError::Capture(CaptureError::RecordingFailed(
                    e.to_string(),
                )));
            }
        }
        Task::none()
    }
}
