// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture and video recording lifecycles
//!
//! The coordinator also owns the frozen snapshot shown while the session
//! swaps inputs or outputs; its presence is what marks a reconfiguration as
//! in flight.

use crate::backends::camera::{
    BackendResult, CaptureProvider, CapturedMedia, FlashMode, FrameOrientation, PhotoCompletion,
    PhotoSettings, RecordingCompletion,
};
use crate::errors::CaptureError;
use crate::storage::MediaStorage;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Visual transition masking a reconfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Blur only (output type swap)
    Blur,
    /// Blur plus a flip of the preview (camera position swap)
    BlurFlip,
}

/// Snapshot held for the duration of a freeze transition
#[derive(Clone)]
pub struct FrozenSnapshot {
    pub kind: TransitionKind,
    pub image: Option<Arc<RgbaImage>>,
}

impl std::fmt::Debug for FrozenSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrozenSnapshot")
            .field("kind", &self.kind)
            .field("has_image", &self.image.is_some())
            .finish()
    }
}

/// Completion of one recording, tagged with the generation it started with
pub type TaggedRecordingCompletion = Box<dyn FnOnce(u64, BackendResult<PathBuf>) + Send>;

#[derive(Clone, Default)]
enum RecordingState {
    #[default]
    Idle,
    Recording {
        generation: u64,
        /// Frame published as the placeholder result at stop
        freeze_frame: Option<Arc<RgbaImage>>,
        path: PathBuf,
    },
}

impl std::fmt::Debug for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Recording {
                generation,
                freeze_frame,
                path,
            } => f
                .debug_struct("Recording")
                .field("generation", generation)
                .field("has_freeze_frame", &freeze_frame.is_some())
                .field("path", path)
                .finish(),
        }
    }
}

/// Result of a recording toggle
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingToggle {
    /// Recording started; ticks carrying `generation` belong to it
    Started { generation: u64, path: PathBuf },
    /// Recording stopped; `placeholder` is shown until the movie is final
    Stopped { placeholder: Option<CapturedMedia> },
}

/// Drives photo capture and recording against the capture provider
pub struct CaptureCoordinator {
    provider: Arc<dyn CaptureProvider>,
    storage: Arc<dyn MediaStorage>,
    freeze: Option<FrozenSnapshot>,
    recording: RecordingState,
    /// Bumped on every start/stop; stale timer ticks are ignored
    timer_generation: u64,
    photos_in_flight: usize,
}

impl CaptureCoordinator {
    pub fn new(provider: Arc<dyn CaptureProvider>, storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            provider,
            storage,
            freeze: None,
            recording: RecordingState::Idle,
            timer_generation: 0,
            photos_in_flight: 0,
        }
    }

    // ===== Freeze transitions =====

    /// Hold `image` as the frozen snapshot; false when a freeze is already active
    pub fn begin_freeze(&mut self, kind: TransitionKind, image: Option<Arc<RgbaImage>>) -> bool {
        if self.freeze.is_some() {
            return false;
        }
        self.freeze = Some(FrozenSnapshot { kind, image });
        true
    }

    /// Whether a reconfiguration transition is in flight
    pub fn is_changing(&self) -> bool {
        self.freeze.is_some()
    }

    /// Release the frozen snapshot
    pub fn end_freeze(&mut self) -> Option<FrozenSnapshot> {
        self.freeze.take()
    }

    // ===== Photo =====

    /// Settings for a still capture; flash only applies on devices with one
    pub fn photo_settings(
        flash: FlashMode,
        has_flash: bool,
        orientation: FrameOrientation,
        mirrored: bool,
    ) -> PhotoSettings {
        PhotoSettings {
            flash: if has_flash { flash } else { FlashMode::Off },
            orientation,
            mirrored,
        }
    }

    /// Trigger a still capture; `done` runs when the hardware delivers
    pub fn capture_photo(&mut self, settings: PhotoSettings, done: PhotoCompletion) {
        self.photos_in_flight += 1;
        info!(flash = ?settings.flash, orientation = ?settings.orientation, "Capturing photo");
        self.provider.capture_photo(settings, done);
    }

    /// Account for a delivered photo
    pub fn photo_finished(&mut self) {
        self.photos_in_flight = self.photos_in_flight.saturating_sub(1);
    }

    pub fn photos_in_flight(&self) -> usize {
        self.photos_in_flight
    }

    // ===== Recording =====

    pub fn is_recording(&self) -> bool {
        matches!(self.recording, RecordingState::Recording { .. })
    }

    /// Whether a finished movie belongs to the recording still in progress
    ///
    /// A stopped recording may finalize after the next one started; its
    /// completion must not end the new recording.
    pub fn is_active_recording(&self, generation: u64) -> bool {
        matches!(
            self.recording,
            RecordingState::Recording { generation: active, .. } if active == generation
        )
    }

    /// Whether a timer tick belongs to the active recording
    pub fn accepts_tick(&self, generation: u64) -> bool {
        self.is_recording() && generation == self.timer_generation
    }

    /// Start recording when idle, stop when recording
    ///
    /// Starting keeps `freeze_frame` for the stop-time placeholder. `done`
    /// is only consumed when a recording starts and receives that
    /// recording's generation.
    pub fn toggle_recording(
        &mut self,
        freeze_frame: Option<Arc<RgbaImage>>,
        done: TaggedRecordingCompletion,
    ) -> Result<RecordingToggle, CaptureError> {
        if self.is_recording() {
            Ok(self.stop_recording())
        } else {
            self.start_recording(freeze_frame, done)
        }
    }

    fn start_recording(
        &mut self,
        freeze_frame: Option<Arc<RgbaImage>>,
        done: TaggedRecordingCompletion,
    ) -> Result<RecordingToggle, CaptureError> {
        let path = self.storage.url_for_new_recording();
        let generation = self.timer_generation + 1;
        let completion: RecordingCompletion = Box::new(move |result| done(generation, result));
        self.provider
            .start_recording(path.clone(), completion)
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "Recording failed to start");
                CaptureError::RecordingStartFailed(e.to_string())
            })?;

        self.timer_generation = generation;
        self.recording = RecordingState::Recording {
            generation,
            freeze_frame,
            path: path.clone(),
        };
        info!(path = %path.display(), generation, "Recording started");

        Ok(RecordingToggle::Started { generation, path })
    }

    /// Stop the active recording, returning the placeholder result
    pub fn stop_recording(&mut self) -> RecordingToggle {
        let state = std::mem::take(&mut self.recording);
        let RecordingState::Recording {
            freeze_frame, path, ..
        } = state
        else {
            debug!("Stop requested while idle");
            return RecordingToggle::Stopped { placeholder: None };
        };

        self.timer_generation += 1;
        self.provider.stop_recording();
        info!(path = %path.display(), "Recording stopped, finalizing");

        RecordingToggle::Stopped {
            placeholder: freeze_frame.map(CapturedMedia::Image),
        }
    }

    /// The hardware finalized the recording on its own (disk full, interruption)
    ///
    /// Returns to idle without asking the provider to stop again.
    pub fn recording_ended(&mut self) {
        if let RecordingState::Recording { path, .. } = std::mem::take(&mut self.recording) {
            warn!(path = %path.display(), "Recording ended without a stop request");
            self.timer_generation += 1;
        }
    }

    /// Return to idle, dropping any frozen snapshot; stops an active recording
    pub fn reset(&mut self) {
        if self.is_recording() {
            self.stop_recording();
        }
        self.freeze = None;
        self.photos_in_flight = 0;
        self.timer_generation += 1;
    }
}

impl std::fmt::Debug for CaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCoordinator")
            .field("freeze", &self.freeze)
            .field("recording", &self.recording)
            .field("photos_in_flight", &self.photos_in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::{ProviderCall, SimulatedCamera};
    use crate::storage::MediaLibrary;
    use image::Rgba;

    fn coordinator() -> (Arc<SimulatedCamera>, CaptureCoordinator) {
        let camera = Arc::new(SimulatedCamera::new());
        camera.set_manual_completion(true);
        let root = std::env::temp_dir().join(format!("camera-session-capture-{}", uuid::Uuid::new_v4()));
        let storage = Arc::new(MediaLibrary::with_root(root));
        (camera.clone(), CaptureCoordinator::new(camera, storage))
    }

    fn frame() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])))
    }

    #[test]
    fn test_second_freeze_is_refused() {
        let (_camera, mut coordinator) = coordinator();

        assert!(coordinator.begin_freeze(TransitionKind::BlurFlip, Some(frame())));
        assert!(coordinator.is_changing());
        assert!(!coordinator.begin_freeze(TransitionKind::Blur, None));

        assert_eq!(coordinator.end_freeze().unwrap().kind, TransitionKind::BlurFlip);
        assert!(!coordinator.is_changing());
    }

    #[test]
    fn test_flash_dropped_without_hardware() {
        let settings =
            CaptureCoordinator::photo_settings(FlashMode::On, false, FrameOrientation::Right, false);
        assert_eq!(settings.flash, FlashMode::Off);

        let settings =
            CaptureCoordinator::photo_settings(FlashMode::Auto, true, FrameOrientation::Up, true);
        assert_eq!(settings.flash, FlashMode::Auto);
        assert!(settings.mirrored);
    }

    #[test]
    fn test_recording_toggle_round_trip() {
        let (camera, mut coordinator) = coordinator();
        let image = frame();

        let started = coordinator
            .toggle_recording(Some(image.clone()), Box::new(|_, _| {}))
            .unwrap();
        let RecordingToggle::Started { generation, path } = started else {
            panic!("expected recording to start");
        };
        assert!(coordinator.is_recording());
        assert!(coordinator.accepts_tick(generation));
        assert!(camera.is_recording());

        let stopped = coordinator.toggle_recording(None, Box::new(|_, _| {})).unwrap();
        assert_eq!(
            stopped,
            RecordingToggle::Stopped {
                placeholder: Some(CapturedMedia::Image(image))
            }
        );
        assert!(!coordinator.is_recording());
        assert!(!coordinator.accepts_tick(generation));
        assert!(camera.calls().contains(&ProviderCall::StartRecording(path)));
        assert_eq!(camera.calls().last(), Some(&ProviderCall::StopRecording));
    }

    #[test]
    fn test_recording_start_failure_stays_idle() {
        let (camera, mut coordinator) = coordinator();
        camera
            .start_recording(PathBuf::from("/tmp/busy.mov"), Box::new(|_| {}))
            .unwrap();

        let result = coordinator.toggle_recording(None, Box::new(|_, _| {}));
        assert!(matches!(result, Err(CaptureError::RecordingStartFailed(_))));
        assert!(!coordinator.is_recording());
    }

    #[test]
    fn test_recording_ended_by_hardware() {
        let (camera, mut coordinator) = coordinator();
        let RecordingToggle::Started { generation, .. } =
            coordinator.toggle_recording(None, Box::new(|_, _| {})).unwrap()
        else {
            panic!("expected recording to start");
        };
        camera.clear_calls();

        coordinator.recording_ended();
        assert!(!coordinator.is_recording());
        assert!(!coordinator.accepts_tick(generation));
        assert!(camera.calls().is_empty());
    }

    #[test]
    fn test_completion_carries_its_generation() {
        let (camera, mut coordinator) = coordinator();
        let finished = Arc::new(std::sync::Mutex::new(Vec::new()));

        let sink = finished.clone();
        let RecordingToggle::Started { generation: first, .. } = coordinator
            .toggle_recording(None, Box::new(move |generation, _| sink.lock().unwrap().push(generation)))
            .unwrap()
        else {
            panic!("expected recording to start");
        };
        coordinator.toggle_recording(None, Box::new(|_, _| {})).unwrap();
        assert!(camera.finish_recording(None));

        let RecordingToggle::Started { generation: second, .. } =
            coordinator.toggle_recording(None, Box::new(|_, _| {})).unwrap()
        else {
            panic!("expected recording to start");
        };

        assert_eq!(*finished.lock().unwrap(), vec![first]);
        assert!(!coordinator.is_active_recording(first));
        assert!(coordinator.is_active_recording(second));
    }

    #[test]
    fn test_photo_in_flight_accounting() {
        let (camera, mut coordinator) = coordinator();
        let settings =
            CaptureCoordinator::photo_settings(FlashMode::Off, true, FrameOrientation::Right, false);

        coordinator.capture_photo(settings, Box::new(|_| {}));
        assert_eq!(coordinator.photos_in_flight(), 1);
        assert_eq!(camera.pending_photos(), 1);

        coordinator.photo_finished();
        coordinator.photo_finished();
        assert_eq!(coordinator.photos_in_flight(), 0);
    }
}
