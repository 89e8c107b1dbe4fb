// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned from `update`
//!
//! Handlers never sleep or await. Anything that has to happen later comes
//! back as a [`Task`] and the runtime turns it into a message once it is due.

use super::state::Message;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;

pub enum Task {
    None,
    /// Deliver a message after a delay
    Delay(Duration, Message),
    /// Deliver the future's output as a message
    Perform(BoxFuture<'static, Message>),
    Batch(Vec<Task>),
}

impl Task {
    pub fn none() -> Self {
        Task::None
    }

    pub fn delay(delay: Duration, message: Message) -> Self {
        Task::Delay(delay, message)
    }

    pub fn perform<F>(future: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Task::Perform(future.boxed())
    }

    /// Combine tasks, dropping empty ones
    pub fn batch(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tasks: Vec<Task> = tasks.into_iter().filter(|t| !t.is_none()).collect();
        match tasks.len() {
            0 => Task::None,
            1 => tasks.pop().unwrap_or(Task::None),
            _ => Task::Batch(tasks),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }

    /// Flatten into leaf tasks
    pub fn into_leaves(self) -> Vec<Task> {
        match self {
            Task::None => Vec::new(),
            Task::Batch(tasks) => tasks.into_iter().flat_map(Task::into_leaves).collect(),
            leaf => vec![leaf],
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::None => write!(f, "Task::None"),
            Task::Delay(delay, message) => f
                .debug_tuple("Task::Delay")
                .field(delay)
                .field(message)
                .finish(),
            Task::Perform(_) => write!(f, "Task::Perform(..)"),
            Task::Batch(tasks) => f.debug_tuple("Task::Batch").field(tasks).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_drops_empty_tasks() {
        assert!(Task::batch([Task::none(), Task::none()]).is_none());

        let single = Task::batch([Task::none(), Task::delay(Duration::from_secs(1), Message::Cancel)]);
        assert!(matches!(single, Task::Delay(_, Message::Cancel)));
    }

    #[test]
    fn test_leaves_are_flattened() {
        let nested = Task::Batch(vec![
            Task::delay(Duration::ZERO, Message::Setup),
            Task::Batch(vec![
                Task::none(),
                Task::perform(async { Message::Cancel }),
            ]),
        ]);
        assert_eq!(nested.into_leaves().len(), 2);
    }
}
