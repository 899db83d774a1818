// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use tokio::{sync::{mpsc, watch},
            task::JoinHandle};

/// Default quiescence window.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Watch the buffer contents published by the loop, and once they stop changing for
/// `window`, forward them to `lookahead_sender`. Blank buffers are not forwarded.
///
/// The task ends when either channel closes. If the consumer is still busy with the
/// previous buffer, the new one is dropped rather than queued.
pub fn spawn_idle_detector(
    window: Duration,
    mut buffer_receiver: watch::Receiver<String>,
    lookahead_sender: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while buffer_receiver.changed().await.is_ok() {
            loop {
                tokio::select! {
                    changed = buffer_receiver.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(window) => break,
                }
            }

            let quiescent = buffer_receiver.borrow_and_update().clone();
            if quiescent.trim().is_empty() {
                continue;
            }
            match lookahead_sender.try_send(quiescent) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::trace!(message = "idle detector: consumer busy, skipped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_emits_once_after_quiescence() {
        let (buffer_sender, buffer_receiver) = watch::channel(String::new());
        let (lookahead_sender, mut lookahead_receiver) = mpsc::channel(4);
        let handle = spawn_idle_detector(
            Duration::from_millis(500),
            buffer_receiver,
            lookahead_sender,
        );

        buffer_sender.send_replace("pr".into());
        tokio::time::sleep(Duration::from_millis(100)).await;
        buffer_sender.send_replace("print".into());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(lookahead_receiver.try_recv().is_err());

        assert_eq!(lookahead_receiver.recv().await, Some("print".to_string()));
        assert!(lookahead_receiver.try_recv().is_err());

        drop(buffer_sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_buffers_are_not_forwarded() {
        let (buffer_sender, buffer_receiver) = watch::channel(String::new());
        let (lookahead_sender, mut lookahead_receiver) = mpsc::channel(4);
        let handle = spawn_idle_detector(
            Duration::from_millis(500),
            buffer_receiver,
            lookahead_sender,
        );

        buffer_sender.send_replace("   ".into());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(lookahead_receiver.try_recv().is_err());

        drop(buffer_sender);
        handle.await.unwrap();
        assert_eq!(lookahead_receiver.recv().await, None);
    }
}
