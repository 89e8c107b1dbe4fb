// SPDX-License-Identifier: GPL-3.0-only

//! Dedicated thread for blocking session start/stop
//!
//! Starting and stopping the hardware session can block for hundreds of
//! milliseconds, so those calls never run on the UI context. Commands are
//! processed in order; results come back through the event callback.

use super::worker::{LoopAction, WorkerLoop};
use super::{BackendResult, CaptureProvider};
use crate::constants::timing::WORKER_POLL_INTERVAL;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    Start,
    Stop,
}

/// Outcome of a worker command
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started(BackendResult<()>),
    Stopped,
}

/// Callback receiving worker events on the worker thread
pub type SessionEventHandler = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Owns the session worker thread
pub struct SessionWorker {
    commands: Option<Sender<SessionCommand>>,
    worker: WorkerLoop,
}

impl SessionWorker {
    /// Spawn the worker thread for `provider`
    pub fn spawn(provider: Arc<dyn CaptureProvider>, on_event: SessionEventHandler) -> Self {
        let (tx, rx) = mpsc::channel::<SessionCommand>();

        let worker = WorkerLoop::start("session-worker", move || {
            match rx.recv_timeout(WORKER_POLL_INTERVAL) {
                Ok(SessionCommand::Start) => {
                    if provider.is_running() {
                        debug!("Session already running");
                        on_event(SessionEvent::Started(Ok(())));
                        return LoopAction::Continue;
                    }
                    let result = provider.start_session();
                    match &result {
                        Ok(()) => info!("Capture session started"),
                        Err(e) => warn!(error = %e, "Capture session failed to start"),
                    }
                    on_event(SessionEvent::Started(result));
                    LoopAction::Continue
                }
                Ok(SessionCommand::Stop) => {
                    if provider.is_running() {
                        provider.stop_session();
                        info!("Capture session stopped");
                    }
                    on_event(SessionEvent::Stopped);
                    LoopAction::Continue
                }
                Err(RecvTimeoutError::Timeout) => LoopAction::Continue,
                Err(RecvTimeoutError::Disconnected) => LoopAction::Stop,
            }
        });

        Self {
            commands: Some(tx),
            worker,
        }
    }

    fn send(&self, command: SessionCommand) {
        let Some(commands) = &self.commands else {
            warn!(?command, "Session worker already shut down");
            return;
        };
        if commands.send(command).is_err() {
            warn!(?command, "Session worker is gone");
        }
    }

    /// Queue a session start
    pub fn start_session(&self) {
        self.send(SessionCommand::Start);
    }

    /// Queue a session stop
    pub fn stop_session(&self) {
        self.send(SessionCommand::Stop);
    }

    /// Process queued commands, then exit and join the thread
    pub fn shutdown(mut self) {
        self.commands.take();
        self.worker.join();
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        // Disconnecting lets the loop drain queued commands and exit
        self.commands.take();
        self.worker.join();
    }
}

impl std::fmt::Debug for SessionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorker")
            .field("running", &self.worker.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::SimulatedCamera;
    use std::sync::Mutex;

    fn collecting_worker(camera: Arc<SimulatedCamera>) -> (SessionWorker, Arc<Mutex<Vec<SessionEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let worker = SessionWorker::spawn(
            camera,
            Arc::new(move |event| sink.lock().unwrap().push(event)),
        );
        (worker, events)
    }

    #[test]
    fn test_start_then_stop_in_order() {
        let camera = Arc::new(SimulatedCamera::new());
        let (worker, events) = collecting_worker(camera.clone());

        worker.start_session();
        worker.stop_session();
        worker.shutdown();

        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::Started(Ok(())), SessionEvent::Stopped]
        );
        assert!(!camera.is_running());
    }

    #[test]
    fn test_start_failure_is_reported() {
        let camera = Arc::new(SimulatedCamera::new());
        camera.set_start_failure(true);
        let (worker, events) = collecting_worker(camera);

        worker.start_session();
        worker.shutdown();

        let events = events.lock().unwrap();
        assert!(matches!(events.as_slice(), [SessionEvent::Started(Err(_))]));
    }
}
