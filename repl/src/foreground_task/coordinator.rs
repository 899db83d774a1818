// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! At most one submitted command runs at a time.
//!
//! ```text
//!            start()                 wait_for_completion() resolves
//!   Idle ─────────────▶ Running ───────────────────────────────▶ Idle (+ TaskOutcome)
//!                          │
//!                          └──── cancel() ──────────────────────▶ Idle (no outcome)
//! ```
//!
//! The job runs on tokio's blocking pool and reports through a `oneshot` channel, so its
//! result is written once and read once. Cancelling flips the job's
//! [`CancellationToken`] and drops the receiving end: whatever the job still returns is
//! discarded, and the loop can accept a new line right away.

use tokio::{sync::oneshot, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{CommandError, EvalError, Value};

pub type TaskResult = Result<Value, CommandError>;

/// The work of one submitted line. Must observe the token at its own suspension points.
pub type ForegroundJob = Box<dyn FnOnce(&CancellationToken) -> TaskResult + Send + 'static>;

/// A finished command, handed to the loop exactly once.
#[derive(Debug)]
pub struct TaskOutcome {
    pub command: String,
    pub result: TaskResult,
}

#[derive(Debug)]
pub struct RunningTask {
    pub command: String,
    pub result_receiver: oneshot::Receiver<TaskResult>,
    pub cancel_token: CancellationToken,
    pub join_handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Running(RunningTask),
}

#[derive(Debug, Default)]
pub struct ForegroundTaskCoordinator {
    pub state: TaskState,
}

impl ForegroundTaskCoordinator {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_running(&self) -> bool { matches!(self.state, TaskState::Running(_)) }

    /// Start `job` for `command`. Returns `false`, and does nothing, if a command is
    /// already running. Must be called from within a tokio runtime.
    pub fn start(&mut self, command: impl Into<String>, job: ForegroundJob) -> bool {
        let command = command.into();
        if self.is_running() {
            tracing::debug!(message = "foreground task: already running, ignored", %command);
            return false;
        }

        let (result_sender, result_receiver) = oneshot::channel();
        let cancel_token = CancellationToken::new();
        let job_token = cancel_token.clone();
        let join_handle = tokio::task::spawn_blocking(move || {
            let result = job(&job_token);
            // The receiver is gone if the task was cancelled.
            let _unused = result_sender.send(result);
        });

        tracing::debug!(message = "foreground task: started", %command);
        self.state = TaskState::Running(RunningTask {
            command,
            result_receiver,
            cancel_token,
            join_handle,
        });
        true
    }

    /// Request cancellation and go back to idle at once. Returns `false` if idle.
    pub fn cancel(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            TaskState::Idle => false,
            TaskState::Running(task) => {
                task.cancel_token.cancel();
                tracing::debug!(message = "foreground task: cancelled", command = %task.command);
                true
            }
        }
    }

    /// Resolves when the running command finishes, then the coordinator is idle again.
    /// Pending forever while idle, which makes it a quiet `select!` branch.
    ///
    /// Cancel safe: dropping the future before it resolves leaves the task running.
    pub async fn wait_for_completion(&mut self) -> TaskOutcome {
        let result = match &mut self.state {
            TaskState::Idle => std::future::pending().await,
            TaskState::Running(task) => (&mut task.result_receiver).await,
        };

        let command = match std::mem::take(&mut self.state) {
            TaskState::Running(task) => task.command,
            TaskState::Idle => String::new(),
        };
        let result = result.unwrap_or_else(|_| {
            // The job panicked before sending.
            Err(CommandError::Eval(EvalError::Process {
                message: "the command panicked".into(),
            }))
        });
        tracing::debug!(message = "foreground task: completed", %command, is_ok = result.is_ok());
        TaskOutcome { command, result }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn sleeping_job(millis: u64) -> ForegroundJob {
        Box::new(move |cancel: &CancellationToken| {
            for _ in 0..millis {
                if cancel.is_cancelled() {
                    return Err(CommandError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok(Value::Int(i64::try_from(millis).unwrap_or_default()))
        })
    }

    #[tokio::test]
    async fn test_completion_is_delivered_once() {
        let mut coordinator = ForegroundTaskCoordinator::new();
        assert!(coordinator.start(
            "job",
            Box::new(|_: &CancellationToken| -> TaskResult { Ok(Value::Int(7)) }),
        ));
        assert!(coordinator.is_running());

        let outcome = coordinator.wait_for_completion().await;
        assert_eq!(outcome.command, "job");
        assert_eq!(outcome.result.unwrap(), Value::Int(7));
        assert!(!coordinator.is_running());

        // Idle: nothing more ever resolves.
        let waited =
            tokio::time::timeout(Duration::from_millis(20), coordinator.wait_for_completion())
                .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_second_start_is_a_no_op() {
        let mut coordinator = ForegroundTaskCoordinator::new();
        assert!(coordinator.start("first", sleeping_job(200)));
        assert!(!coordinator.start("second", sleeping_job(1)));
        let TaskState::Running(task) = &coordinator.state else {
            panic!("expected a running task");
        };
        assert_eq!(task.command, "first");
        coordinator.cancel();
    }

    #[tokio::test]
    async fn test_cancel_goes_straight_to_idle_without_a_result() {
        let mut coordinator = ForegroundTaskCoordinator::new();
        assert!(coordinator.start("sleep", sleeping_job(10_000)));

        assert!(coordinator.cancel());
        assert!(!coordinator.is_running());
        assert!(!coordinator.cancel());

        let waited =
            tokio::time::timeout(Duration::from_millis(50), coordinator.wait_for_completion())
                .await;
        assert!(waited.is_err());

        // A new line is accepted immediately.
        assert!(coordinator.start("next", sleeping_job(1)));
        let outcome = coordinator.wait_for_completion().await;
        assert_eq!(outcome.command, "next");
        assert_eq!(outcome.result.unwrap(), Value::Int(1));
    }

    #[tokio::test]
    async fn test_wait_is_cancel_safe() {
        let mut coordinator = ForegroundTaskCoordinator::new();
        coordinator.start("slow", sleeping_job(100));

        let waited =
            tokio::time::timeout(Duration::from_millis(1), coordinator.wait_for_completion())
                .await;
        assert!(waited.is_err());
        assert!(coordinator.is_running());

        let outcome = coordinator.wait_for_completion().await;
        assert_eq!(outcome.result.unwrap(), Value::Int(100));
    }

    #[tokio::test]
    async fn test_panicking_job_reports_an_error() {
        let mut coordinator = ForegroundTaskCoordinator::new();
        coordinator.start(
            "boom",
            Box::new(|_: &CancellationToken| -> TaskResult { panic!("boom") }),
        );
        let outcome = coordinator.wait_for_completion().await;
        assert!(matches!(
            outcome.result,
            Err(CommandError::Eval(EvalError::Process { .. }))
        ));
    }
}
