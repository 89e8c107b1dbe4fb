// SPDX-License-Identifier: GPL-3.0-only

//! Motion sensor interface

use std::sync::Arc;
use std::time::Duration;

/// Single accelerometer sample in units of g
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Errors reported by the motion sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// No accelerometer on this device
    Unavailable,
    /// A sample could not be read
    Sampling(String),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::Unavailable => write!(f, "Accelerometer unavailable"),
            SensorError::Sampling(msg) => write!(f, "Sampling error: {}", msg),
        }
    }
}

impl std::error::Error for SensorError {}

/// Callback invoked on the sensor's own thread for every sample
pub type MotionHandler = Arc<dyn Fn(Result<Acceleration, SensorError>) + Send + Sync>;

/// Periodic accelerometer source
pub trait MotionSensor: Send + Sync {
    /// Begin delivering samples to `handler` every `interval`
    fn start_updates(&self, interval: Duration, handler: MotionHandler) -> Result<(), SensorError>;

    /// Stop delivering samples; idempotent
    fn stop_updates(&self);
}
