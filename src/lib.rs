// SPDX-License-Identifier: GPL-3.0-only

//! Camera Session - the core of a live camera capture session
//!
//! This library owns the lifecycle of a capture session: device discovery,
//! permission gating, per-device configuration, orientation tracking, the
//! filtered preview path, photo capture and video recording. Hardware is
//! reached through collaborator traits so the same core runs against real
//! devices or the simulated set in [`backends::simulated`].
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session state machine, message handlers and runtimes
//! - [`backends`]: Collaborator traits and device configuration
//! - [`pipelines`]: Preview frame path, filters and capture coordination
//! - [`config`]: Persisted preferences
//! - [`storage`]: Media file locations
//!
//! # Example
//!
//! ```ignore
//! let hardware = SimulatedHardware::new();
//! let runtime = SessionRuntime::spawn(Config::load(), hardware.collaborators());
//! let handle = runtime.handle();
//! handle.send(Message::Setup);
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{CameraSession, Message, SessionHandle, SessionPhase, SessionRuntime, SessionSnapshot};
pub use backends::Collaborators;
pub use config::Config;
pub use errors::{CaptureError, ConfigurationError, SessionError};
pub use pipelines::FilterType;
