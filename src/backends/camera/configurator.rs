// SPDX-License-Identifier: GPL-3.0-only

//! Atomic device configuration
//!
//! Every mutation runs as acquire → mutate → release on the device's
//! configuration lock. Calls for the same device are serialized through a
//! per-device mutex so they queue instead of colliding on the hardware lock,
//! which is non-reentrant.

use super::types::*;
use super::{CaptureProvider, DeviceConfiguration};
use crate::errors::{ConfigResult, ConfigurationError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Applies validated, clamped settings to capture devices
pub struct DeviceConfigurator {
    provider: Arc<dyn CaptureProvider>,
    /// Per-device serialization slots
    slots: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl DeviceConfigurator {
    pub fn new(provider: Arc<dyn CaptureProvider>) -> Self {
        Self {
            provider,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, device: &DeviceId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(device.clone()).or_default())
    }

    /// Run `mutate` while holding the device's configuration lock
    ///
    /// The lock is held for the mutation only and released on every path.
    /// Lock acquisition failures surface as [`ConfigurationError::DeviceBusy`].
    pub fn with_configuration<T>(
        &self,
        device: &CaptureDevice,
        mutate: impl FnOnce(&mut dyn DeviceConfiguration) -> BackendResult<T>,
    ) -> ConfigResult<T> {
        let slot = self.slot(device.id());
        let _serial = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut lock = self.provider.lock_for_configuration(device.id()).map_err(|e| {
            warn!(device = %device.id(), error = %e, "Configuration lock unavailable");
            ConfigurationError::DeviceBusy(e.to_string())
        })?;
        let result = mutate(lock.as_mut());
        drop(lock);

        result.map_err(|e| {
            warn!(device = %device.id(), error = %e, "Device rejected configuration");
            ConfigurationError::from(e)
        })
    }

    /// Clamp and apply a zoom factor; returns the applied value
    pub fn apply_zoom(&self, device: &CaptureDevice, requested: f64) -> ConfigResult<f64> {
        let factor = device.capabilities.clamp_zoom(requested);
        self.with_configuration(device, |config| config.set_zoom_factor(factor))?;
        debug!(requested, applied = factor, "Zoom applied");
        Ok(factor)
    }

    /// Apply a partial exposure change on top of `current`
    ///
    /// Each field is clamped to the device range. Duration and ISO changes are
    /// skipped (not an error) on devices without custom exposure. Returns the
    /// resulting settings.
    pub fn apply_exposure(
        &self,
        device: &CaptureDevice,
        current: &ExposureSettings,
        request: ExposureRequest,
    ) -> ConfigResult<ExposureSettings> {
        let caps = &device.capabilities;
        let mut applied = current.clone();

        if let Some(mode) = request.mode {
            if caps.supports_exposure_mode(mode) {
                applied.mode = mode;
            } else {
                debug!(?mode, "Exposure mode unsupported, ignoring");
            }
        }

        let custom_requested = request.duration.is_some() || request.iso.is_some();
        if custom_requested {
            if caps.supports_custom_exposure() {
                if let Some(duration) = request.duration {
                    applied.duration = caps.clamp_exposure_duration(duration);
                }
                if let Some(iso) = request.iso {
                    applied.iso = caps.clamp_iso(iso);
                }
                applied.mode = ExposureMode::Custom;
            } else {
                debug!("Custom exposure unsupported, ignoring duration/ISO change");
            }
        }

        if let Some(bias) = request.target_bias {
            applied.target_bias = caps.clamp_exposure_bias(bias);
        }

        if applied == *current {
            return Ok(applied);
        }

        let custom_changed = applied.mode == ExposureMode::Custom
            && (applied.duration != current.duration
                || applied.iso != current.iso
                || current.mode != ExposureMode::Custom);
        let mode_changed = applied.mode != current.mode && applied.mode != ExposureMode::Custom;
        let bias_changed = applied.target_bias != current.target_bias;

        self.with_configuration(device, |config| {
            if custom_changed {
                config.set_custom_exposure(applied.duration, applied.iso)?;
            }
            if mode_changed {
                config.set_exposure_mode(applied.mode)?;
            }
            if bias_changed {
                config.set_exposure_target_bias(applied.target_bias)?;
            }
            Ok(())
        })?;

        debug!(?applied, "Exposure applied");
        Ok(applied)
    }

    /// Set min and max frame duration to `1/fps`
    ///
    /// Fails with `InvalidFrameRate` outside `[15, device max]` without touching the device.
    pub fn apply_frame_rate(&self, device: &CaptureDevice, fps: u32) -> ConfigResult<u32> {
        let max = device.capabilities.max_frame_rate();
        if !device.capabilities.accepts_frame_rate(fps) {
            return Err(ConfigurationError::InvalidFrameRate { requested: fps, max });
        }

        let frame_duration = Duration::from_secs_f64(1.0 / fps as f64);
        self.with_configuration(device, |config| {
            config.set_frame_duration(frame_duration, frame_duration)
        })?;
        info!(fps, "Frame rate applied");
        Ok(fps)
    }

    /// Flash is a per-capture setting; `None` when the device has no flash
    pub fn apply_flash(&self, device: &CaptureDevice, mode: FlashMode) -> Option<FlashMode> {
        if !device.capabilities.has_flash {
            debug!(device = %device.id(), "Device has no flash, ignoring");
            return None;
        }
        Some(mode)
    }

    /// Apply a torch mode; `Ok(None)` when the device has no torch
    pub fn apply_torch(&self, device: &CaptureDevice, mode: TorchMode) -> ConfigResult<Option<TorchMode>> {
        if !device.capabilities.has_torch {
            debug!(device = %device.id(), "Device has no torch, ignoring");
            return Ok(None);
        }
        self.with_configuration(device, |config| config.set_torch_mode(mode))?;
        Ok(Some(mode))
    }

    /// Apply an HDR mode; `Ok(None)` when the active format has no video HDR
    pub fn apply_hdr(&self, device: &CaptureDevice, mode: HdrMode) -> ConfigResult<Option<HdrMode>> {
        if !device.capabilities.supports_hdr {
            debug!(device = %device.id(), "Device has no video HDR, ignoring");
            return Ok(None);
        }
        self.with_configuration(device, |config| config.set_hdr_mode(mode))?;
        Ok(Some(mode))
    }

    /// Point focus and exposure at `point`; `Ok(None)` without point-of-interest support
    pub fn apply_focus(&self, device: &CaptureDevice, point: FocusPoint) -> ConfigResult<Option<FocusPoint>> {
        if !device.capabilities.supports_focus_point {
            debug!(device = %device.id(), "Device has no focus point of interest, ignoring");
            return Ok(None);
        }
        self.with_configuration(device, |config| config.set_point_of_interest(point))?;
        Ok(Some(point))
    }
}

impl std::fmt::Debug for DeviceConfigurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfigurator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::{ProviderCall, SimulatedCamera};

    fn setup() -> (Arc<SimulatedCamera>, DeviceConfigurator, CaptureDevice) {
        let camera = Arc::new(SimulatedCamera::new());
        let configurator = DeviceConfigurator::new(camera.clone());
        let device = super::super::DeviceRegistry::new(camera.clone())
            .resolve_devices()
            .unwrap()
            .back
            .unwrap();
        (camera, configurator, device)
    }

    #[test]
    fn test_zoom_is_clamped_to_capped_range() {
        let (camera, configurator, device) = setup();

        assert_eq!(configurator.apply_zoom(&device, 10.0).unwrap(), 3.0);
        assert_eq!(configurator.apply_zoom(&device, 0.1).unwrap(), device.capabilities.min_zoom);
        assert_eq!(camera.device_state(device.id()).zoom_factor, device.capabilities.min_zoom);
        assert!(!camera.is_locked(device.id()));
    }

    #[test]
    fn test_lock_released_after_backend_failure() {
        let (camera, configurator, device) = setup();
        camera.fail_next_configuration();

        let result = configurator.apply_zoom(&device, 2.0);
        assert!(matches!(result, Err(ConfigurationError::Backend(_))));
        assert!(!camera.is_locked(device.id()));

        // The next change goes through normally
        assert_eq!(configurator.apply_zoom(&device, 2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_lock_failure_is_device_busy() {
        let (camera, configurator, device) = setup();
        camera.set_lock_failure(true);

        assert!(matches!(
            configurator.apply_zoom(&device, 2.0),
            Err(ConfigurationError::DeviceBusy(_))
        ));
    }

    #[test]
    fn test_frame_rate_bounds() {
        let (camera, configurator, device) = setup();
        let max = device.capabilities.max_frame_rate();
        camera.clear_calls();

        assert_eq!(
            configurator.apply_frame_rate(&device, 14),
            Err(ConfigurationError::InvalidFrameRate { requested: 14, max })
        );
        assert!(configurator.apply_frame_rate(&device, max + 1).is_err());
        assert!(camera.calls().is_empty(), "invalid rates must not lock the device");

        assert_eq!(configurator.apply_frame_rate(&device, 24).unwrap(), 24);
        let state = camera.device_state(device.id());
        assert_eq!(state.min_frame_duration, Duration::from_secs_f64(1.0 / 24.0));
        assert_eq!(state.max_frame_duration, state.min_frame_duration);
    }

    #[test]
    fn test_exposure_fields_clamped_independently() {
        let (_camera, configurator, device) = setup();
        let caps = device.capabilities.clone();
        let current = ExposureSettings::default();

        let applied = configurator
            .apply_exposure(
                &device,
                &current,
                ExposureRequest {
                    duration: Some(Duration::from_secs(10)),
                    iso: Some(1.0),
                    target_bias: Some(100.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(applied.duration, caps.max_exposure_duration);
        assert_eq!(applied.iso, caps.min_iso);
        assert_eq!(applied.target_bias, caps.max_exposure_bias);
        assert_eq!(applied.mode, ExposureMode::Custom);
    }

    #[test]
    fn test_custom_exposure_is_noop_without_support() {
        let camera = Arc::new(SimulatedCamera::with_devices(vec![
            SimulatedCamera::fixed_exposure_camera(),
        ]));
        let configurator = DeviceConfigurator::new(camera.clone());
        let device = super::super::DeviceRegistry::new(camera.clone())
            .resolve_devices()
            .unwrap()
            .front
            .unwrap();
        camera.clear_calls();

        let current = ExposureSettings::default();
        let applied = configurator
            .apply_exposure(
                &device,
                &current,
                ExposureRequest {
                    duration: Some(Duration::from_millis(5)),
                    iso: Some(400.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(applied, current);
        assert!(camera.calls().is_empty());
    }

    #[test]
    fn test_torch_and_flash_noop_without_hardware() {
        let camera = Arc::new(SimulatedCamera::new());
        let configurator = DeviceConfigurator::new(camera.clone());
        let front = super::super::DeviceRegistry::new(camera.clone())
            .resolve_devices()
            .unwrap()
            .front
            .unwrap();
        camera.clear_calls();

        assert_eq!(configurator.apply_torch(&front, TorchMode::On).unwrap(), None);
        assert_eq!(configurator.apply_flash(&front, FlashMode::On), None);
        assert!(camera.calls().is_empty());
    }

    #[test]
    fn test_concurrent_changes_are_serialized() {
        let (camera, configurator, device) = setup();
        let configurator = Arc::new(configurator);
        camera.clear_calls();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let configurator = Arc::clone(&configurator);
                let device = device.clone();
                std::thread::spawn(move || {
                    configurator
                        .apply_zoom(&device, 1.0 + i as f64 * 0.25)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every lock is followed by its unlock before the next lock
        let mut held = false;
        for call in camera.calls() {
            match call {
                ProviderCall::Lock(_) => {
                    assert!(!held, "configuration locks overlapped");
                    held = true;
                }
                ProviderCall::Unlock(_) => held = false,
                _ => {}
            }
        }
        assert!(!held);
    }
}
