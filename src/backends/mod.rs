// SPDX-License-Identifier: GPL-3.0-only

//! Hardware abstraction layer
//!
//! The session core never talks to hardware directly. Every external
//! collaborator is a trait object:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                CameraSession                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │               Collaborators                 │
//! │  ┌───────────────┐  ┌──────────────┐        │
//! │  │CaptureProvider│  │ MotionSensor │        │
//! │  └───────────────┘  └──────────────┘        │
//! │  ┌───────────────┐  ┌──────────────┐        │
//! │  │  GpuRenderer  │  │  UiSurface   │        │
//! │  └───────────────┘  └──────────────┘        │
//! │  ┌───────────────┐  ┌──────────────┐        │
//! │  │PermissionGate │  │ MediaStorage │        │
//! │  └───────────────┘  └──────────────┘        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Capture devices, configuration and the session worker
//! - [`motion`]: Accelerometer samples
//! - [`permissions`]: Camera/microphone authorization
//! - [`render`]: Preview renderer
//! - [`surface`]: UI host surface and view effects
//! - [`simulated`]: In-process hardware used by tests and the CLI

pub mod camera;
pub mod motion;
pub mod permissions;
pub mod render;
pub mod simulated;
pub mod surface;

use crate::storage::MediaStorage;
use camera::CaptureProvider;
use motion::MotionSensor;
use permissions::PermissionGate;
use render::GpuRenderer;
use std::sync::Arc;
use surface::UiSurface;

/// External collaborators handed to a session at construction
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn CaptureProvider>,
    pub motion: Arc<dyn MotionSensor>,
    pub renderer: Arc<dyn GpuRenderer>,
    pub surface: Arc<dyn UiSurface>,
    pub permissions: Arc<dyn PermissionGate>,
    pub storage: Arc<dyn MediaStorage>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
