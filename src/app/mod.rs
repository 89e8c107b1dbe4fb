// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! # Architecture
//!
//! - `state`: Snapshot types and the [`Message`] enum
//! - `task`: Deferred work returned from `update`
//! - `update`: Message dispatcher
//! - `handlers`: Message handlers grouped by domain
//! - `orientation`: Logical orientation and frame tags
//! - `animation`: View effect timing
//! - `runtime`: Drivers that feed messages and run tasks
//!
//! # Threading
//!
//! [`CameraSession`] lives on the UI context and is only touched through
//! [`CameraSession::update`]. Hardware callbacks (photo delivery, movie
//! finalization, session worker results, motion samples) never mutate it
//! directly; they post a [`Message`] to the session's [`Mailbox`].

pub mod animation;
mod handlers;
pub mod orientation;
pub mod runtime;
pub mod state;
pub mod task;
mod update;

pub use animation::{AnimationSequencer, ScheduledEffect};
pub use orientation::OrientationTracker;
pub use runtime::{Mailbox, ManualRuntime, SessionHandle, SessionRuntime};
pub use state::{
    Attributes, DeviceOrientation, Message, Reconfiguration, SessionPhase, SessionSnapshot,
};
pub use task::Task;

use crate::backends::Collaborators;
use crate::backends::camera::{
    CaptureDevice, DeviceConfigurator, DeviceId, DeviceRegistry, OutputType, ResolvedDevices,
    SessionWorker,
};
use crate::config::Config;
use crate::errors::{ConfigResult, ConfigurationError};
use crate::pipelines::{CaptureCoordinator, FramePipeline};
use std::sync::Arc;

/// Permission answers collected during setup
#[derive(Debug, Clone, Copy, Default)]
struct SetupProgress {
    camera: Option<bool>,
    microphone: Option<bool>,
    /// Devices and outputs were wired; waiting for the session worker
    wired: bool,
}

/// What setup attached to the capture session
#[derive(Debug, Clone)]
struct Wiring {
    camera: DeviceId,
    microphone: Option<DeviceId>,
    output: OutputType,
}

/// A camera or output swap waiting for its freeze lead time
#[derive(Debug, Clone, Copy)]
struct PendingReconfiguration {
    id: u64,
    change: Reconfiguration,
}

/// The capture session core
pub struct CameraSession {
    config: Config,
    collaborators: Collaborators,
    mailbox: Mailbox,
    phase: SessionPhase,
    attributes: Attributes,
    registry: DeviceRegistry,
    configurator: DeviceConfigurator,
    pipeline: Arc<FramePipeline>,
    capture: CaptureCoordinator,
    tracker: OrientationTracker,
    devices: Option<ResolvedDevices>,
    wiring: Option<Wiring>,
    worker: Option<SessionWorker>,
    setup: SetupProgress,
    pending: Option<PendingReconfiguration>,
    reconfiguration_counter: u64,
}

impl CameraSession {
    /// Create an idle session; nothing touches hardware until `Setup`
    pub fn new(config: Config, collaborators: Collaborators, mailbox: Mailbox) -> Self {
        let provider = Arc::clone(&collaborators.provider);
        let attributes = Attributes::from_config(&config);
        Self {
            registry: DeviceRegistry::new(Arc::clone(&provider)),
            configurator: DeviceConfigurator::new(Arc::clone(&provider)),
            pipeline: Arc::new(FramePipeline::new(Arc::clone(&collaborators.renderer))),
            capture: CaptureCoordinator::new(provider, Arc::clone(&collaborators.storage)),
            tracker: OrientationTracker::new(),
            config,
            collaborators,
            mailbox,
            phase: SessionPhase::Uninitialized,
            attributes,
            devices: None,
            wiring: None,
            worker: None,
            setup: SetupProgress::default(),
            pending: None,
            reconfiguration_counter: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<FramePipeline> {
        &self.pipeline
    }

    pub fn tracker(&self) -> &OrientationTracker {
        &self.tracker
    }

    /// Whether a camera/output swap is in flight
    pub fn is_changing(&self) -> bool {
        self.capture.is_changing()
    }

    /// Devices resolved at setup
    pub fn devices(&self) -> Option<&ResolvedDevices> {
        self.devices.as_ref()
    }

    /// Everything observers see after an update
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            attributes: self.attributes.clone(),
            is_changing: self.capture.is_changing(),
            frame_orientation: self.pipeline.orientation(),
            stats: self.pipeline.stats(),
        }
    }

    /// Camera at the selected position, only while the session runs
    pub(crate) fn active_device(&self) -> ConfigResult<&CaptureDevice> {
        if self.phase != SessionPhase::Running {
            return Err(ConfigurationError::NotRunning);
        }
        self.devices
            .as_ref()
            .and_then(|devices| devices.camera(self.attributes.camera_position))
            .ok_or(ConfigurationError::NotRunning)
    }

    /// Apply zero-delay effects now and turn the rest into delayed messages
    pub(crate) fn schedule(&self, effects: Vec<ScheduledEffect>) -> Task {
        let mut tasks = Vec::new();
        for ScheduledEffect { delay, effect } in effects {
            if delay.is_zero() {
                self.collaborators.surface.apply(&effect);
            } else {
                tasks.push(Task::delay(delay, Message::ApplyViewEffect(effect)));
            }
        }
        Task::batch(tasks)
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("phase", &self.phase)
            .field("attributes", &self.attributes)
            .field("capture", &self.capture)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
