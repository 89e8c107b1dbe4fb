// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for background workers
//!
//! Session start/stop and the simulated frame source both run blocking work
//! off the UI context. This module gives them one way to spawn, stop and
//! join such threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by a worker iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Run another iteration
    Continue,
    /// Exit the loop
    Stop,
}

/// Controller for a loop running on its own thread
///
/// The loop runs until its closure returns [`LoopAction::Stop`] or the
/// controller is stopped. Dropping the controller stops and joins the thread.
///
/// # Example
///
/// ```ignore
/// let mut worker = WorkerLoop::start("frame-source", move || {
///     emit_next_frame();
///     thread::sleep(frame_interval);
///     LoopAction::Continue
/// });
///
/// worker.stop();
/// ```
pub struct WorkerLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl WorkerLoop {
    /// Start `loop_fn` on a new named thread
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_init(name, || Ok(()), move |_: &mut ()| loop_fn())
    }

    /// Start a loop whose state is built on the worker thread
    ///
    /// If `init_fn` fails the thread exits without running the loop.
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> Self
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting worker loop");

        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = match init_fn() {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(name = %name_clone, error = %e, "Worker initialization failed");
                        return;
                    }
                };

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    if loop_fn(&mut state) == LoopAction::Stop {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }
                }

                info!(name = %name_clone, "Worker loop exiting");
            });

        let thread_handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to spawn worker thread");
                None
            }
        };

        Self {
            thread_handle,
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Whether the thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting worker stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Signal the loop to stop and wait for the thread
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread without signalling it
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Joining ourselves would deadlock; the loop exits on its own
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Worker thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Worker thread finished");
            }
        }
    }
}

impl Drop for WorkerLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut worker = WorkerLoop::start("test-loop", move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            if count >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        worker.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut worker = WorkerLoop::start("test-loop", move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(50));
        worker.stop();
        assert!(counter.load(Ordering::SeqCst) > 0);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_init_state_reaches_loop() {
        let result = Arc::new(AtomicU32::new(0));
        let result_clone = Arc::clone(&result);

        let mut worker = WorkerLoop::start_with_init(
            "test-init-loop",
            || Ok(42u32),
            move |state| {
                result_clone.store(*state, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        worker.join();
        assert_eq!(result.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_init_failure_skips_loop() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let mut worker = WorkerLoop::start_with_init(
            "test-fail-init",
            || Err::<(), _>("no device".to_string()),
            move |_: &mut ()| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        worker.join();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_stops_running_loop() {
        let worker = WorkerLoop::start("test-running", || {
            thread::sleep(Duration::from_millis(20));
            LoopAction::Continue
        });

        assert!(worker.is_running());
        drop(worker);
    }
}
