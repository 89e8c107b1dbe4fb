// SPDX-License-Identifier: GPL-3.0-only

//! Exposure control handlers
//!
//! Every change goes through [`DeviceConfigurator::apply_exposure`], which
//! clamps each value to the device range. Duration and ISO only apply on
//! cameras with custom exposure.
//!
//! [`DeviceConfigurator::apply_exposure`]: crate::backends::camera::DeviceConfigurator::apply_exposure

use crate::app::CameraSession;
use crate::backends::camera::{ExposureMode, ExposureRequest, ExposureSettings};
use crate::errors::ConfigResult;
use std::time::Duration;

impl CameraSession {
    pub fn change_exposure_mode(&mut self, mode: ExposureMode) -> ConfigResult<ExposureSettings> {
        self.change_exposure(ExposureRequest {
            mode: Some(mode),
            ..Default::default()
        })
    }

    /// Switches to custom exposure when supported
    pub fn change_exposure_duration(&mut self, duration: Duration) -> ConfigResult<ExposureSettings> {
        self.change_exposure(ExposureRequest {
            duration: Some(duration),
            ..Default::default()
        })
    }

    /// Switches to custom exposure when supported
    pub fn change_iso(&mut self, iso: f32) -> ConfigResult<ExposureSettings> {
        self.change_exposure(ExposureRequest {
            iso: Some(iso),
            ..Default::default()
        })
    }

    pub fn change_exposure_target_bias(&mut self, bias: f32) -> ConfigResult<ExposureSettings> {
        self.change_exposure(ExposureRequest {
            target_bias: Some(bias),
            ..Default::default()
        })
    }

    fn change_exposure(&mut self, request: ExposureRequest) -> ConfigResult<ExposureSettings> {
        let applied = self.configurator.apply_exposure(
            self.active_device()?,
            &self.attributes.exposure,
            request,
        )?;
        self.attributes.exposure = applied.clone();
        Ok(applied)
    }
}
