// SPDX-License-Identifier: GPL-3.0-only

//! Capture device registry
//!
//! The registry provides:
//! - Device resolution (front camera, back camera, microphone)
//! - Capability lookups for resolved devices

use super::CaptureProvider;
use super::types::*;
use crate::errors::{SessionError, SessionResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Devices resolved at setup
///
/// Descriptors are immutable for the session's lifetime and are only
/// re-resolved on a full teardown and setup.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDevices {
    pub front: Option<CaptureDevice>,
    pub back: Option<CaptureDevice>,
    pub microphone: Option<CaptureDevice>,
}

impl ResolvedDevices {
    /// Camera at a position, if the hardware has one
    pub fn camera(&self, position: CameraPosition) -> Option<&CaptureDevice> {
        match position {
            CameraPosition::Front => self.front.as_ref(),
            CameraPosition::Back => self.back.as_ref(),
        }
    }

    /// Camera at a position, failing with `DeviceUnavailable` when absent
    pub fn require_camera(&self, position: CameraPosition) -> SessionResult<&CaptureDevice> {
        self.camera(position).ok_or_else(|| {
            SessionError::DeviceUnavailable(format!("no {} camera", position))
        })
    }
}

/// Resolves capture devices and exposes their capabilities
#[derive(Clone)]
pub struct DeviceRegistry {
    provider: Arc<dyn CaptureProvider>,
}

impl DeviceRegistry {
    pub fn new(provider: Arc<dyn CaptureProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the front camera, back camera and microphone
    ///
    /// Fails with `DeviceUnavailable` when the hardware has no camera at all.
    /// The first device of each kind wins; duplicates are ignored.
    pub fn resolve_devices(&self) -> SessionResult<ResolvedDevices> {
        let mut resolved = ResolvedDevices::default();

        for info in self.provider.list_devices() {
            let slot = match info.kind {
                DeviceKind::Camera(CameraPosition::Front) => &mut resolved.front,
                DeviceKind::Camera(CameraPosition::Back) => &mut resolved.back,
                DeviceKind::Microphone => &mut resolved.microphone,
            };
            if slot.is_some() {
                debug!(device = %info.id, "Ignoring additional device of the same kind");
                continue;
            }

            let capabilities = match self.provider.capabilities(&info) {
                Ok(capabilities) => capabilities,
                Err(e) => {
                    warn!(device = %info.id, error = %e, "Capability query failed, skipping device");
                    continue;
                }
            };

            info!(device = %info.id, name = %info.name, kind = ?info.kind, "Resolved capture device");
            *slot = Some(CaptureDevice { info, capabilities });
        }

        if resolved.front.is_none() && resolved.back.is_none() {
            return Err(SessionError::DeviceUnavailable(
                "no camera devices found".to_string(),
            ));
        }

        Ok(resolved)
    }

    /// Capability ranges of a resolved device
    pub fn capabilities(&self, device: &CaptureDevice) -> DeviceCapabilities {
        device.capabilities.clone()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::SimulatedCamera;

    #[test]
    fn test_resolves_all_standard_devices() {
        let camera = Arc::new(SimulatedCamera::new());
        let registry = DeviceRegistry::new(camera);

        let devices = registry.resolve_devices().unwrap();
        assert!(devices.front.is_some());
        assert!(devices.back.is_some());
        assert!(devices.microphone.is_some());
        assert_eq!(
            devices.require_camera(CameraPosition::Back).unwrap().position(),
            Some(CameraPosition::Back)
        );
    }

    #[test]
    fn test_missing_cameras_is_fatal() {
        let camera = Arc::new(SimulatedCamera::with_devices(vec![SimulatedCamera::microphone()]));
        let registry = DeviceRegistry::new(camera);

        assert!(matches!(
            registry.resolve_devices(),
            Err(SessionError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_position_reported_on_require() {
        let camera = Arc::new(SimulatedCamera::with_devices(vec![
            SimulatedCamera::back_camera(),
        ]));
        let devices = DeviceRegistry::new(camera).resolve_devices().unwrap();

        assert!(devices.microphone.is_none());
        assert!(matches!(
            devices.require_camera(CameraPosition::Front),
            Err(SessionError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let registry = DeviceRegistry::new(Arc::new(SimulatedCamera::new()));
        let first = registry.resolve_devices().unwrap();
        let second = registry.resolve_devices().unwrap();
        assert_eq!(first.back, second.back);
        assert_eq!(first.front, second.front);
    }
}
