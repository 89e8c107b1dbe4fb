// SPDX-License-Identifier: GPL-3.0-only

//! Session state types and messages

use crate::backends::camera::{
    BackendResult, CameraPosition, CapturedMedia, ExposureMode, ExposureSettings, FlashMode,
    FocusPoint, FrameOrientation, HdrMode, OutputType, ResolutionPreset, TorchMode,
};
use crate::backends::motion::{Acceleration, SensorError};
use crate::backends::permissions::{PermissionKind, PermissionStatus};
use crate::backends::surface::{UiRotation, ViewEffect};
use crate::config::Config;
use crate::errors::SessionError;
use crate::pipelines::{FilterType, PipelineStats};
use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    /// Permissions, devices and wiring are being set up
    Configuring,
    /// The capture session confirmed it is running
    Running,
    /// Torn down; `setup` may start over
    Cancelled,
}

/// Logical device orientation derived from the accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// The configuration snapshot observed by the UI
///
/// Only [`super::CameraSession`] mutates it, from the UI context.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub captured_media: Option<CapturedMedia>,
    pub error: Option<SessionError>,
    pub output_type: OutputType,
    pub camera_position: CameraPosition,
    pub filters: Vec<FilterType>,
    pub zoom_factor: f64,
    pub flash_mode: FlashMode,
    pub torch_mode: TorchMode,
    pub exposure: ExposureSettings,
    pub hdr_mode: HdrMode,
    pub resolution: ResolutionPreset,
    pub frame_rate: u32,
    pub mirror_output: bool,
    pub grid_visible: bool,
    pub is_recording: bool,
    pub recording_time: Duration,
    pub device_orientation: DeviceOrientation,
    pub user_blocked_rotation: bool,
}

impl Attributes {
    pub fn from_config(config: &Config) -> Self {
        Self {
            captured_media: None,
            error: None,
            output_type: config.output_type,
            camera_position: config.camera_position,
            filters: config.filters.clone(),
            zoom_factor: config.zoom_factor,
            flash_mode: config.flash_mode,
            torch_mode: TorchMode::Off,
            exposure: ExposureSettings::default(),
            hdr_mode: config.hdr_mode,
            resolution: config.resolution,
            frame_rate: config.frame_rate,
            mirror_output: config.mirror_output,
            grid_visible: config.grid_visible,
            is_recording: false,
            recording_time: Duration::ZERO,
            device_orientation: DeviceOrientation::Portrait,
            user_blocked_rotation: false,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything published to observers after an update
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub attributes: Attributes,
    /// A camera/output swap is in flight
    pub is_changing: bool,
    pub frame_orientation: FrameOrientation,
    pub stats: PipelineStats,
}

/// Heavy reconfiguration masked by a freeze transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconfiguration {
    Camera(CameraPosition),
    Output(OutputType),
}

/// Messages handled on the UI context
///
/// Messages are organized into logical groups:
/// - **Lifecycle**: setup, teardown and session worker results
/// - **Camera Control**: camera/output swaps and device settings
/// - **Capture Operations**: photo capture, recording and their completions
/// - **Orientation**: accelerometer samples and UI rotation
/// - **Animation**: delayed view effects
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Lifecycle =====
    Setup,
    Cancel,
    /// Answer to an asynchronous permission prompt
    PermissionResolved(PermissionKind, PermissionStatus),
    /// Session worker finished starting the session
    SessionStarted(BackendResult<()>),
    /// Session worker finished stopping the session
    SessionStopped,

    // ===== Camera Control =====
    ChangeCamera(CameraPosition),
    ChangeOutputType(OutputType),
    /// Lead time of a freeze elapsed; swap the input/output now
    CompleteReconfiguration(u64),
    /// The blur of a finished swap faded out; drop the freeze view
    FreezeRemoved(u64),
    ChangeZoomFactor(f64),
    ChangeFlashMode(FlashMode),
    ChangeTorchMode(TorchMode),
    ChangeExposureMode(ExposureMode),
    ChangeExposureDuration(Duration),
    ChangeIso(f32),
    ChangeExposureTargetBias(f32),
    ChangeHdrMode(HdrMode),
    ChangeResolution(ResolutionPreset),
    ChangeFrameRate(u32),
    ChangeMirrorOutput(bool),
    ChangeGridVisibility(bool),
    ChangeCameraFilters(Vec<FilterType>),
    SetCameraFocus(FocusPoint),
    LockOrientation(bool),

    // ===== Capture Operations =====
    CaptureOutput,
    PhotoCaptured(BackendResult<CapturedMedia>),
    /// One-second tick of the recording timer with its generation
    RecordingTick(u64),
    /// A movie was finalized; carries the generation of its recording
    RecordingFinished(u64, BackendResult<PathBuf>),

    // ===== Orientation =====
    MotionSample(Result<Acceleration, SensorError>),
    DeviceRotationChanged(UiRotation),

    // ===== Animation =====
    ApplyViewEffect(ViewEffect),
}
