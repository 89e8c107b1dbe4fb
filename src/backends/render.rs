// SPDX-License-Identifier: GPL-3.0-only

//! GPU renderer interface

use crate::backends::camera::ProcessedFrame;
use std::sync::Arc;
use std::time::Duration;

/// A tagged, filtered frame handed to the renderer for the preview surface
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub frame: Arc<ProcessedFrame>,
}

/// Timing reported back after a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawTiming {
    pub duration: Duration,
}

/// GPU renderer drawing into the preview drawable
pub trait GpuRenderer: Send + Sync {
    /// Draw one frame; returns once the draw completed
    fn draw(&self, request: &RenderRequest) -> DrawTiming;

    /// Release GPU resources (textures, drawable)
    fn release(&self);
}
