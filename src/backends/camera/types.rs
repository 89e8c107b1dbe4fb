// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture device abstraction

//! Shared types for capture backends

use crate::constants::{frame_rate, zoom};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Physical position of a camera on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraPosition {
    /// World-facing camera
    #[default]
    Back,
    /// User-facing (selfie) camera
    Front,
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
        }
    }
}

/// Which capture output is attached to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputType {
    #[default]
    Photo,
    Video,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Photo => write!(f, "photo"),
            OutputType::Video => write!(f, "video"),
        }
    }
}

/// What kind of capture device a descriptor refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Camera(CameraPosition),
    Microphone,
}

/// Stable backend identifier of a capture device
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device identity as reported by the capture provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

/// Frame rate range supported by the active format
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateRange {
    pub min: f64,
    pub max: f64,
}

impl FrameRateRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Exposure control modes a camera may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExposureMode {
    /// Exposure is frozen at its current value
    Locked,
    /// Single automatic adjustment, then locked
    AutoExpose,
    /// Continuous automatic exposure
    #[default]
    ContinuousAuto,
    /// Caller controls exposure duration and ISO
    Custom,
}

/// Capability ranges of a capture device
///
/// Resolved once at setup and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCapabilities {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_exposure_duration: Duration,
    pub max_exposure_duration: Duration,
    pub min_iso: f32,
    pub max_iso: f32,
    pub min_exposure_bias: f32,
    pub max_exposure_bias: f32,
    pub exposure_modes: Vec<ExposureMode>,
    pub frame_rate_ranges: Vec<FrameRateRange>,
    pub has_flash: bool,
    pub has_torch: bool,
    pub supports_hdr: bool,
    pub supports_focus_point: bool,
}

impl DeviceCapabilities {
    /// Capabilities of a device that exposes no camera controls (microphones)
    pub fn none() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 1.0,
            min_exposure_duration: Duration::ZERO,
            max_exposure_duration: Duration::ZERO,
            min_iso: 0.0,
            max_iso: 0.0,
            min_exposure_bias: 0.0,
            max_exposure_bias: 0.0,
            exposure_modes: Vec::new(),
            frame_rate_ranges: Vec::new(),
            has_flash: false,
            has_torch: false,
            supports_hdr: false,
            supports_focus_point: false,
        }
    }

    /// Zoom range the session is allowed to use: `[min_zoom, min(max_zoom, 3.0)]`
    pub fn zoom_range(&self) -> (f64, f64) {
        let upper = self.max_zoom.min(zoom::MAX_ZOOM_FACTOR).max(self.min_zoom);
        (self.min_zoom, upper)
    }

    /// Clamp a requested zoom factor into [`Self::zoom_range`]
    pub fn clamp_zoom(&self, requested: f64) -> f64 {
        let (min, max) = self.zoom_range();
        if requested.is_nan() {
            return min;
        }
        requested.clamp(min, max)
    }

    /// Highest integer frame rate of the active format (0 when unknown)
    pub fn max_frame_rate(&self) -> u32 {
        self.frame_rate_ranges
            .iter()
            .map(|range| range.max)
            .fold(0.0_f64, f64::max)
            .floor() as u32
    }

    /// Whether `fps` lies within `[15, max_frame_rate]`
    pub fn accepts_frame_rate(&self, fps: u32) -> bool {
        fps >= frame_rate::MIN_FRAME_RATE && fps <= self.max_frame_rate()
    }

    pub fn supports_exposure_mode(&self, mode: ExposureMode) -> bool {
        self.exposure_modes.contains(&mode)
    }

    pub fn supports_custom_exposure(&self) -> bool {
        self.supports_exposure_mode(ExposureMode::Custom)
    }

    pub fn clamp_exposure_duration(&self, duration: Duration) -> Duration {
        duration.clamp(
            self.min_exposure_duration,
            self.max_exposure_duration.max(self.min_exposure_duration),
        )
    }

    pub fn clamp_iso(&self, iso: f32) -> f32 {
        if iso.is_nan() {
            return self.min_iso;
        }
        iso.clamp(self.min_iso, self.max_iso.max(self.min_iso))
    }

    pub fn clamp_exposure_bias(&self, bias: f32) -> f32 {
        let bias = if bias.is_nan() { 0.0 } else { bias };
        bias.clamp(
            self.min_exposure_bias,
            self.max_exposure_bias.max(self.min_exposure_bias),
        )
    }
}

/// Resolved device descriptor: identity plus capability ranges
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureDevice {
    pub info: DeviceInfo,
    pub capabilities: DeviceCapabilities,
}

impl CaptureDevice {
    pub fn id(&self) -> &DeviceId {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Camera position, `None` for microphones
    pub fn position(&self) -> Option<CameraPosition> {
        match self.info.kind {
            DeviceKind::Camera(position) => Some(position),
            DeviceKind::Microphone => None,
        }
    }
}

/// Image orientation tag attached to every frame
///
/// Variants follow the EXIF/TIFF orientation naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameOrientation {
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    /// Sensor-native orientation of a back camera held in portrait
    #[default]
    Right,
    RightMirrored,
    Left,
}

impl FrameOrientation {
    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            FrameOrientation::UpMirrored
                | FrameOrientation::DownMirrored
                | FrameOrientation::LeftMirrored
                | FrameOrientation::RightMirrored
        )
    }

    /// Whether the tag flips the image upside down relative to the sensor
    pub fn is_upside_down(self) -> bool {
        matches!(self, FrameOrientation::Down | FrameOrientation::DownMirrored)
    }
}

/// Frame as delivered by the capture stream callback
#[derive(Clone)]
pub struct RawFrame {
    pub image: Arc<RgbaImage>,
    /// Capture timestamp relative to session start
    pub timestamp: Duration,
    pub sequence: u64,
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("timestamp", &self.timestamp)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Frame after orientation tagging and filtering, ready for the renderer
#[derive(Clone)]
pub struct ProcessedFrame {
    pub image: Arc<RgbaImage>,
    pub orientation: FrameOrientation,
    pub timestamp: Duration,
    pub sequence: u64,
}

impl std::fmt::Debug for ProcessedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedFrame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("orientation", &self.orientation)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Callback invoked on the capture thread for every delivered frame
pub type FrameHandler = Arc<dyn Fn(RawFrame) + Send + Sync>;

/// Photo flash behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
}

/// Continuous torch (flashlight) behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TorchMode {
    #[default]
    Off,
    On,
    Auto,
}

/// Video HDR behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HdrMode {
    #[default]
    Auto,
    On,
    Off,
}

/// Capture session quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPreset {
    /// Full sensor resolution for stills
    Photo,
    #[default]
    High,
    Medium,
    Low,
    Hd1280x720,
    Hd1920x1080,
    Uhd3840x2160,
}

/// Current exposure configuration of the active camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    pub duration: Duration,
    pub iso: f32,
    pub target_bias: f32,
    pub mode: ExposureMode,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_micros(16_667),
            iso: 100.0,
            target_bias: 0.0,
            mode: ExposureMode::ContinuousAuto,
        }
    }
}

/// Partial exposure change; every field is optional and clamped independently
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExposureRequest {
    pub mode: Option<ExposureMode>,
    pub duration: Option<Duration>,
    pub iso: Option<f32>,
    pub target_bias: Option<f32>,
}

/// Normalized point of interest (0.0-1.0 on both axes, top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: if x.is_nan() { 0.5 } else { x.clamp(0.0, 1.0) },
            y: if y.is_nan() { 0.5 } else { y.clamp(0.0, 1.0) },
        }
    }

    /// Convert a point in view coordinates into a normalized point of interest
    pub fn from_view(x: f64, y: f64, width: f64, height: f64) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::new(0.5, 0.5);
        }
        Self::new(x / width, y / height)
    }
}

/// Settings handed to the hardware for a single still capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoSettings {
    pub flash: FlashMode,
    pub orientation: FrameOrientation,
    pub mirrored: bool,
}

/// Result of a capture, published into the configuration snapshot
#[derive(Clone, PartialEq)]
pub enum CapturedMedia {
    Image(Arc<RgbaImage>),
    Video(PathBuf),
}

impl CapturedMedia {
    pub fn is_image(&self) -> bool {
        matches!(self, CapturedMedia::Image(_))
    }

    pub fn video_path(&self) -> Option<&PathBuf> {
        match self {
            CapturedMedia::Image(_) => None,
            CapturedMedia::Video(path) => Some(path),
        }
    }
}

impl std::fmt::Debug for CapturedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapturedMedia::Image(image) => {
                write!(f, "CapturedMedia::Image({}x{})", image.width(), image.height())
            }
            CapturedMedia::Video(path) => write!(f, "CapturedMedia::Video({})", path.display()),
        }
    }
}

/// Completion callback for an asynchronous still capture
pub type PhotoCompletion = Box<dyn FnOnce(BackendResult<Arc<RgbaImage>>) + Send>;

/// Completion callback for a finished recording
pub type RecordingCompletion = Box<dyn FnOnce(BackendResult<PathBuf>) + Send>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Configuration lock could not be acquired
    DeviceBusy(String),
    /// Session refused an input
    InputRejected(String),
    /// Session refused an output
    OutputRejected(String),
    /// Capture or recording failed in hardware
    CaptureFailed(String),
    /// Recording already in progress
    RecordingInProgress,
    /// No recording in progress
    NoRecordingInProgress,
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::InputRejected(msg) => write!(f, "Input rejected: {}", msg),
            BackendError::OutputRejected(msg) => write!(f, "Output rejected: {}", msg),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::RecordingInProgress => write!(f, "Recording already in progress"),
            BackendError::NoRecordingInProgress => write!(f, "No recording in progress"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(min_zoom: f64, max_zoom: f64, max_fps: f64) -> DeviceCapabilities {
        DeviceCapabilities {
            min_zoom,
            max_zoom,
            frame_rate_ranges: vec![FrameRateRange::new(1.0, 30.0), FrameRateRange::new(1.0, max_fps)],
            ..DeviceCapabilities::none()
        }
    }

    #[test]
    fn test_zoom_range_is_capped() {
        assert_eq!(caps(1.0, 10.0, 30.0).zoom_range(), (1.0, 3.0));
        assert_eq!(caps(1.0, 2.0, 30.0).zoom_range(), (1.0, 2.0));
        assert_eq!(caps(1.0, 10.0, 30.0).clamp_zoom(f64::NAN), 1.0);
    }

    #[test]
    fn test_max_frame_rate_uses_widest_range() {
        let caps = caps(1.0, 1.0, 60.0);
        assert_eq!(caps.max_frame_rate(), 60);
        assert!(caps.accepts_frame_rate(15));
        assert!(caps.accepts_frame_rate(60));
        assert!(!caps.accepts_frame_rate(14));
        assert!(!caps.accepts_frame_rate(61));
    }

    #[test]
    fn test_focus_point_from_view() {
        let point = FocusPoint::from_view(50.0, 300.0, 100.0, 200.0);
        assert_eq!(point, FocusPoint::new(0.5, 1.0));
        assert_eq!(FocusPoint::from_view(1.0, 1.0, 0.0, 0.0), FocusPoint::new(0.5, 0.5));
    }
}
