// SPDX-License-Identifier: GPL-3.0-only

//! Frame and capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Capture      │ ──▶ │  FramePipeline    │ ──▶ │ GpuRenderer  │
//! │ stream       │     │  - orientation tag│     │ (latest wins)│
//! │              │     │  - filter chain   │     │              │
//! └──────────────┘     └─────────┬─────────┘     └──────────────┘
//!                                │ snapshot
//!                                ▼
//!                      ┌───────────────────┐
//!                      │CaptureCoordinator │ ──▶ photo / recording
//!                      │ - freeze snapshot │
//!                      └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`preview`]: Orientation tagging, filtering and preview hand-off
//! - [`filters`]: CPU image filters
//! - [`capture`]: Photo and recording lifecycles, freeze snapshots

pub mod capture;
pub mod filters;
pub mod preview;

pub use capture::{
    CaptureCoordinator, FrozenSnapshot, RecordingToggle, TaggedRecordingCompletion, TransitionKind,
};
pub use filters::FilterType;
pub use preview::{FramePipeline, PipelineStats, PreviewRenderer};
