// SPDX-License-Identifier: GPL-3.0-only

//! Live preview frame pipeline
//!
//! Frames arrive on the capture callback thread, get the current orientation
//! tag and filter chain, and are handed to a render thread. There is no frame
//! queue: the render thread always draws the newest frame and anything
//! superseded before it was drawn is dropped.
//!
//! ```text
//!  capture thread                     render thread
//!  ──────────────                     ─────────────
//!  RawFrame ─► tag ─► filters ─► [pending slot] ─► GpuRenderer::draw
//!                        │        (latest wins)
//!                        ▼
//!                 current frame ─► capture_snapshot()
//! ```

use super::filters::{self, FilterType};
use crate::backends::camera::worker::{LoopAction, WorkerLoop};
use crate::backends::camera::{FrameHandler, FrameOrientation, ProcessedFrame, RawFrame};
use crate::backends::render::{GpuRenderer, RenderRequest};
use crate::constants::timing::{FRAME_LOG_INTERVAL, WORKER_POLL_INTERVAL};
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frame counters of the preview path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Frames accepted from the capture stream
    pub submitted: u64,
    /// Frames the renderer finished drawing
    pub drawn: u64,
    /// Frames replaced in the pending slot before they were drawn
    pub superseded: u64,
}

struct RenderShared {
    renderer: Arc<dyn GpuRenderer>,
    pending: Mutex<Option<RenderRequest>>,
    ready: Condvar,
    drawn: AtomicU64,
    superseded: AtomicU64,
}

/// Latest-wins bridge between the frame path and the GPU renderer
pub struct PreviewRenderer {
    shared: Arc<RenderShared>,
    worker: Mutex<Option<WorkerLoop>>,
}

impl PreviewRenderer {
    pub fn new(renderer: Arc<dyn GpuRenderer>) -> Self {
        Self {
            shared: Arc::new(RenderShared {
                renderer,
                pending: Mutex::new(None),
                ready: Condvar::new(),
                drawn: AtomicU64::new(0),
                superseded: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Start the render thread; no-op when already running
    pub fn start(&self) {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        *worker = Some(WorkerLoop::start("preview-render", move || {
            let request = {
                let pending = lock(&shared.pending);
                let (mut pending, _) = shared
                    .ready
                    .wait_timeout_while(pending, WORKER_POLL_INTERVAL, |p| p.is_none())
                    .unwrap_or_else(PoisonError::into_inner);
                pending.take()
            };

            if let Some(request) = request {
                shared.renderer.draw(&request);
                shared.drawn.fetch_add(1, Ordering::SeqCst);
            }
            LoopAction::Continue
        }));
    }

    /// Stop and join the render thread, dropping any undrawn frame
    pub fn stop(&self) {
        let worker = lock(&self.worker).take();
        if let Some(mut worker) = worker {
            worker.request_stop();
            self.shared.ready.notify_all();
            worker.join();
        }
        lock(&self.shared.pending).take();
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(WorkerLoop::is_running)
    }

    /// Hand a frame to the renderer without waiting
    pub fn present(&self, request: RenderRequest) {
        let replaced = lock(&self.shared.pending).replace(request);
        if replaced.is_some() {
            self.shared.superseded.fetch_add(1, Ordering::SeqCst);
        }
        self.shared.ready.notify_one();
    }

    pub fn drawn(&self) -> u64 {
        self.shared.drawn.load(Ordering::SeqCst)
    }

    pub fn superseded(&self) -> u64 {
        self.shared.superseded.load(Ordering::SeqCst)
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Orientation tagging, filtering and preview hand-off
pub struct FramePipeline {
    orientation: RwLock<FrameOrientation>,
    filters: RwLock<Vec<FilterType>>,
    current: Mutex<Option<Arc<ProcessedFrame>>>,
    preview: PreviewRenderer,
    submitted: AtomicU64,
}

impl FramePipeline {
    pub fn new(renderer: Arc<dyn GpuRenderer>) -> Self {
        Self {
            orientation: RwLock::new(FrameOrientation::default()),
            filters: RwLock::new(Vec::new()),
            current: Mutex::new(None),
            preview: PreviewRenderer::new(renderer),
            submitted: AtomicU64::new(0),
        }
    }

    pub fn orientation(&self) -> FrameOrientation {
        *self.orientation.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tag applied to every frame submitted from now on
    pub fn set_orientation(&self, orientation: FrameOrientation) {
        *self.orientation.write().unwrap_or_else(PoisonError::into_inner) = orientation;
    }

    pub fn filters(&self) -> Vec<FilterType> {
        self.filters.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the filter chain; applied in list order
    pub fn set_filters(&self, filters: Vec<FilterType>) {
        debug!(?filters, "Filter chain updated");
        *self.filters.write().unwrap_or_else(PoisonError::into_inner) = filters;
    }

    /// Tag and filter a frame and store it as the current frame
    pub fn process(&self, raw: RawFrame) -> RenderRequest {
        let orientation = self.orientation();
        let image = {
            let filters = self.filters.read().unwrap_or_else(PoisonError::into_inner);
            match filters::apply_chain(&raw.image, &filters) {
                Some(filtered) => Arc::new(filtered),
                None => raw.image,
            }
        };

        let frame = Arc::new(ProcessedFrame {
            image,
            orientation,
            timestamp: raw.timestamp,
            sequence: raw.sequence,
        });
        *lock(&self.current) = Some(Arc::clone(&frame));

        let count = self.submitted.fetch_add(1, Ordering::Relaxed) + 1;
        if count % FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = count,
                sequence = frame.sequence,
                ?orientation,
                superseded = self.preview.superseded(),
                "Preview frame processed"
            );
        }

        RenderRequest { frame }
    }

    /// Process a frame and hand it to the renderer; never waits on a draw
    pub fn submit(&self, raw: RawFrame) -> RenderRequest {
        let request = self.process(raw);
        self.preview.present(request.clone());
        request
    }

    /// Most recently processed image, `None` before the first frame
    pub fn capture_snapshot(&self) -> Option<Arc<RgbaImage>> {
        lock(&self.current)
            .as_ref()
            .map(|frame| Arc::clone(&frame.image))
    }

    pub fn current_frame(&self) -> Option<Arc<ProcessedFrame>> {
        lock(&self.current).clone()
    }

    /// Callback to install on the capture stream
    pub fn frame_handler(self: &Arc<Self>) -> FrameHandler {
        let pipeline = Arc::clone(self);
        Arc::new(move |frame: RawFrame| {
            pipeline.submit(frame);
        })
    }

    pub fn start_rendering(&self) {
        info!("Starting preview rendering");
        self.preview.start();
    }

    pub fn stop_rendering(&self) {
        self.preview.stop();
    }

    pub fn is_rendering(&self) -> bool {
        self.preview.is_running()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            drawn: self.preview.drawn(),
            superseded: self.preview.superseded(),
        }
    }

    /// Drop the current frame and stop rendering; filters and tag are kept
    pub fn reset(&self) {
        self.preview.stop();
        lock(&self.current).take();
    }
}

impl std::fmt::Debug for FramePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("orientation", &self.orientation())
            .field("filters", &self.filters())
            .field("stats", &self.stats())
            .finish()
    }
}
