// SPDX-License-Identifier: GPL-3.0-only

//! Session drivers
//!
//! A driver owns the [`CameraSession`], feeds it messages one at a time and
//! turns the returned [`Task`]s back into messages.
//!
//! - [`SessionRuntime`] runs on tokio: delays are real timers and snapshots
//!   are published on a watch channel after every update.
//! - [`ManualRuntime`] runs on the caller's thread with a simulated clock, so
//!   transitions and recording timers can be stepped deterministically.

use super::CameraSession;
use super::state::{Message, SessionSnapshot};
use super::task::Task;
use crate::backends::Collaborators;
use crate::config::Config;
use futures::future::BoxFuture;
use std::future::Future;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sending side of the session's message queue
///
/// Cloned into every hardware callback; posting never blocks.
#[derive(Debug, Clone)]
pub struct Mailbox(mpsc::UnboundedSender<Message>);

impl Mailbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Mailbox(tx), rx)
    }

    pub fn post(&self, message: Message) {
        if let Err(e) = self.0.send(message) {
            debug!(message = ?e.0, "Session is gone, dropping message");
        }
    }
}

// =============================================================================
// Tokio runtime
// =============================================================================

/// Client side of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    mailbox: Mailbox,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn send(&self, message: Message) {
        self.mailbox.post(message);
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified after every update
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until a snapshot satisfies `predicate`; `None` on timeout
    pub async fn wait_for(
        &self,
        timeout: Duration,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Option<SessionSnapshot> {
        let mut rx = self.snapshot.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|snapshot| predicate(snapshot))).await {
            Ok(Ok(snapshot)) => Some(snapshot.clone()),
            // Timed out, or the session loop is gone
            _ => None,
        }
    }
}

/// A session driven by a tokio task
pub struct SessionRuntime {
    handle: SessionHandle,
    stop: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<CameraSession>>,
}

impl SessionRuntime {
    /// Spawn the session loop; must be called from within a tokio runtime
    pub fn spawn(config: Config, collaborators: Collaborators) -> Self {
        let (mailbox, rx) = Mailbox::channel();
        let session = CameraSession::new(config, collaborators, mailbox.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (stop_tx, stop_rx) = oneshot::channel();

        let join = tokio::spawn(run_session(session, rx, snapshot_tx, stop_rx, mailbox.clone()));
        info!("Session runtime started");

        Self {
            handle: SessionHandle {
                mailbox,
                snapshot: snapshot_rx,
            },
            stop: Some(stop_tx),
            join: Some(join),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Cancel the session, stop the loop and hand the session back
    pub async fn shutdown(mut self) -> Option<CameraSession> {
        self.handle.send(Message::Cancel);
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let join = self.join.take()?;
        match join.await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Session loop panicked");
                None
            }
        }
    }
}

async fn run_session(
    mut session: CameraSession,
    mut rx: mpsc::UnboundedReceiver<Message>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    mut stop_rx: oneshot::Receiver<()>,
    mailbox: Mailbox,
) -> CameraSession {
    loop {
        tokio::select! {
            // Queued messages (including the final Cancel) drain before stopping
            biased;
            message = rx.recv() => {
                let Some(message) = message else { break };
                let task = session.update(message);
                spawn_task(task, &mailbox);
                snapshot_tx.send_replace(session.snapshot());
            }
            _ = &mut stop_rx => break,
        }
    }
    debug!("Session loop stopped");
    session
}

fn spawn_task(task: Task, mailbox: &Mailbox) {
    for leaf in task.into_leaves() {
        let mailbox = mailbox.clone();
        match leaf {
            Task::Delay(delay, message) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    mailbox.post(message);
                });
            }
            Task::Perform(future) => {
                tokio::spawn(async move {
                    mailbox.post(future.await);
                });
            }
            Task::None | Task::Batch(_) => {}
        }
    }
}

// =============================================================================
// Manual runtime
// =============================================================================

struct Timer {
    due: Duration,
    seq: u64,
    message: Message,
}

/// A session driven on the caller's thread with a simulated clock
///
/// Delays only fire when [`ManualRuntime::advance`] moves the clock past
/// them. Messages posted from hardware threads are picked up by
/// [`ManualRuntime::run_pending`].
pub struct ManualRuntime {
    session: CameraSession,
    mailbox: Mailbox,
    rx: mpsc::UnboundedReceiver<Message>,
    now: Duration,
    timer_seq: u64,
    timers: Vec<Timer>,
    futures: Vec<BoxFuture<'static, Message>>,
}

impl ManualRuntime {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let (mailbox, rx) = Mailbox::channel();
        let session = CameraSession::new(config, collaborators, mailbox.clone());
        Self {
            session,
            mailbox,
            rx,
            now: Duration::ZERO,
            timer_seq: 0,
            timers: Vec::new(),
            futures: Vec::new(),
        }
    }

    /// Queue a message and process everything that is ready
    pub fn send(&mut self, message: Message) {
        self.mailbox.post(message);
        self.run_pending();
    }

    /// Process queued messages, ready futures and due timers until idle
    pub fn run_pending(&mut self) {
        loop {
            let mut progressed = false;

            while let Ok(message) = self.rx.try_recv() {
                self.dispatch(message);
                progressed = true;
            }

            progressed |= self.poll_futures();

            if let Some(message) = self.pop_due_timer(self.now) {
                self.dispatch(message);
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    /// Move the simulated clock forward, firing timers in due order
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        self.run_pending();
        while let Some(due) = self.next_due().filter(|due| *due <= target) {
            self.now = self.now.max(due);
            self.run_pending();
        }
        self.now = target;
        self.run_pending();
    }

    /// Poll in real time for messages from hardware threads
    ///
    /// Returns false when `predicate` still fails after `timeout`.
    pub fn wait_for(
        &mut self,
        timeout: Duration,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> bool {
        let started = Instant::now();
        loop {
            self.run_pending();
            if predicate(&self.session.snapshot()) {
                return true;
            }
            if started.elapsed() >= timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CameraSession {
        &mut self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of delayed messages not yet fired
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Run a task returned by a direct call on [`Self::session_mut`]
    pub fn run_task(&mut self, task: Task) {
        self.enqueue(task);
        self.run_pending();
    }

    fn dispatch(&mut self, message: Message) {
        let task = self.session.update(message);
        self.enqueue(task);
    }

    fn enqueue(&mut self, task: Task) {
        for leaf in task.into_leaves() {
            match leaf {
                Task::Delay(delay, message) => {
                    self.timer_seq += 1;
                    self.timers.push(Timer {
                        due: self.now + delay,
                        seq: self.timer_seq,
                        message,
                    });
                }
                Task::Perform(future) => self.futures.push(future),
                Task::None | Task::Batch(_) => {}
            }
        }
    }

    fn poll_futures(&mut self) -> bool {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut ready = Vec::new();
        self.futures.retain_mut(|future| match future.as_mut().poll(&mut cx) {
            Poll::Ready(message) => {
                ready.push(message);
                false
            }
            Poll::Pending => true,
        });
        let progressed = !ready.is_empty();
        for message in ready {
            self.dispatch(message);
        }
        progressed
    }

    fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    fn pop_due_timer(&mut self, now: Duration) -> Option<Message> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(index, _)| index)?;
        Some(self.timers.swap_remove(index).message)
    }
}

impl std::fmt::Debug for ManualRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualRuntime")
            .field("now", &self.now)
            .field("pending_timers", &self.timers.len())
            .field("pending_futures", &self.futures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::SessionPhase;
    use crate::backends::simulated::SimulatedHardware;

    #[test]
    fn test_timers_fire_in_due_order() {
        let hardware = SimulatedHardware::new();
        let mut runtime = ManualRuntime::new(Config::default(), hardware.collaborators());

        runtime.run_task(Task::batch([
            Task::delay(Duration::from_millis(300), Message::LockOrientation(false)),
            Task::delay(Duration::from_millis(100), Message::LockOrientation(true)),
        ]));
        assert_eq!(runtime.pending_timers(), 2);

        runtime.advance(Duration::from_millis(150));
        assert_eq!(runtime.pending_timers(), 1);
        assert!(runtime.session().tracker().is_locked());

        runtime.advance(Duration::from_millis(150));
        assert_eq!(runtime.pending_timers(), 0);
        assert!(!runtime.session().tracker().is_locked());
        assert_eq!(runtime.now(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_runtime_publishes_snapshots() {
        let hardware = SimulatedHardware::new();
        let runtime = SessionRuntime::spawn(Config::default(), hardware.collaborators());
        let handle = runtime.handle();

        handle.send(Message::Setup);
        let running = handle
            .wait_for(Duration::from_secs(5), |s| s.phase == SessionPhase::Running)
            .await;
        assert!(running.is_some());

        let session = runtime.shutdown().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Cancelled);
    }
}
