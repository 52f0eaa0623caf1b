//! Periodic removal of old completed tasks.

use crate::client::ClientError;
use crate::controller::tasks::TaskController;
use crate::controller::view::TaskListView;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to a running sweep loop. The first sweep runs immediately.
pub struct StaleTaskSweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl StaleTaskSweeper {
    pub fn spawn<V: TaskListView>(controller: TaskController<V>, interval: Duration, retention_days: u32) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        match controller.sweep_once(retention_days).await {
                            Ok(_) => {}
                            Err(ClientError::NotSignedIn) => tracing::debug!("sweep skipped, not signed in"),
                            Err(e) => tracing::warn!(error = %e, "stale task sweep failed"),
                        }
                    }
                }
            }
            tracing::debug!("stale task sweeper stopped");
        });
        Self { token, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop to stop without waiting.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
