// SPDX-License-Identifier: GPL-3.0-only

//! Capture device abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    CameraSession    │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴───────┬──────────────────┐
//!     ▼              ▼                  ▼
//! ┌──────────┐ ┌──────────────┐ ┌───────────────┐
//! │ Registry │ │ Configurator │ │ SessionWorker │  ← start/stop off the UI context
//! └────┬─────┘ └──────┬───────┘ └───────┬───────┘
//!      └──────────────┼─────────────────┘
//!                     ▼
//!          ┌─────────────────────┐
//!          │ CaptureProvider     │  ← hardware capture session
//!          └─────────────────────┘
//! ```

pub mod configurator;
pub mod registry;
pub mod session_worker;
pub mod types;
pub mod worker;

pub use configurator::DeviceConfigurator;
pub use registry::{DeviceRegistry, ResolvedDevices};
pub use session_worker::{SessionEvent, SessionWorker};
pub use types::*;

use std::path::PathBuf;
use std::time::Duration;

/// Exclusive configuration access to one device
///
/// Obtained from [`CaptureProvider::lock_for_configuration`]. Implementations
/// release the hardware lock when the value is dropped, so every exit path
/// (including early `?` returns) unlocks the device.
pub trait DeviceConfiguration {
    fn set_zoom_factor(&mut self, factor: f64) -> BackendResult<()>;

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> BackendResult<()>;

    /// Switch to custom exposure with the given duration and ISO
    fn set_custom_exposure(&mut self, duration: Duration, iso: f32) -> BackendResult<()>;

    fn set_exposure_target_bias(&mut self, bias: f32) -> BackendResult<()>;

    fn set_hdr_mode(&mut self, mode: HdrMode) -> BackendResult<()>;

    /// Set the minimum and maximum frame duration of the active format
    fn set_frame_duration(&mut self, min: Duration, max: Duration) -> BackendResult<()>;

    fn set_torch_mode(&mut self, mode: TorchMode) -> BackendResult<()>;

    /// Set focus and exposure point of interest
    fn set_point_of_interest(&mut self, point: FocusPoint) -> BackendResult<()>;
}

/// Scoped configuration lock; dropping it releases the device
pub type ConfigurationLock<'a> = Box<dyn DeviceConfiguration + 'a>;

/// Hardware capture session and its devices
///
/// All capture backends must implement this trait to provide:
/// - Device enumeration and capability queries
/// - Exclusive per-device configuration access
/// - Input/output wiring of the capture session
/// - Session start/stop (called from the session worker thread only)
/// - Still capture and movie recording with asynchronous completion
pub trait CaptureProvider: Send + Sync {
    // ===== Enumeration =====

    /// Enumerate capture devices
    fn list_devices(&self) -> Vec<DeviceInfo>;

    /// Query capability ranges of a device
    fn capabilities(&self, device: &DeviceInfo) -> BackendResult<DeviceCapabilities>;

    // ===== Configuration =====

    /// Acquire the exclusive configuration lock of a device
    ///
    /// The lock is non-reentrant: a second call while a lock is held fails
    /// with [`BackendError::DeviceBusy`].
    fn lock_for_configuration(&self, device: &DeviceId) -> BackendResult<ConfigurationLock<'_>>;

    // ===== Session wiring =====

    fn add_input(&self, device: &DeviceId) -> BackendResult<()>;

    fn remove_input(&self, device: &DeviceId);

    fn add_output(&self, output: OutputType) -> BackendResult<()>;

    fn remove_output(&self, output: OutputType);

    fn set_resolution(&self, preset: ResolutionPreset) -> BackendResult<()>;

    /// Install (or clear) the frame callback of the capture stream
    fn set_frame_handler(&self, handler: Option<FrameHandler>);

    // ===== Lifecycle =====

    /// Start the capture session; blocking, never called on the UI context
    fn start_session(&self) -> BackendResult<()>;

    /// Stop the capture session; blocking, never called on the UI context
    fn stop_session(&self);

    fn is_running(&self) -> bool;

    // ===== Capture =====

    /// Trigger a still capture; `done` runs on a hardware thread
    fn capture_photo(&self, settings: PhotoSettings, done: PhotoCompletion);

    /// Start recording to `path`; `done` runs once the movie is finalized
    fn start_recording(&self, path: PathBuf, done: RecordingCompletion) -> BackendResult<()>;

    /// Stop the active recording; finalization completes asynchronously
    fn stop_recording(&self);
}
