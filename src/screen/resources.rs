use super::keys::{HostKeyEvents, KeySubscription};
use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Resources a screen holds between entry and exit.
///
/// Dropping the value aborts outstanding tasks and unsubscribes from host
/// keys, on every exit path.
pub struct ScreenResources {
    tasks: JoinSet<()>,
    keys: Option<KeySubscription>,
}

impl ScreenResources {
    /// Acquire resources at screen entry
    pub fn acquire(key_events: &HostKeyEvents) -> Self {
        debug!("Acquiring screen resources");
        Self {
            tasks: JoinSet::new(),
            keys: Some(key_events.subscribe()),
        }
    }

    /// Run background work owned by the screen
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Reap finished background tasks
    pub fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_abnormal(result);
        }
    }

    /// Wait up to `limit` for every outstanding task to finish.
    ///
    /// Returns `false` if some task was still running when the limit expired;
    /// those are aborted on drop.
    pub async fn settle(&mut self, limit: Duration) -> bool {
        let tasks = &mut self.tasks;
        let settled = timeout(limit, async {
            while let Some(result) = tasks.join_next().await {
                log_abnormal(result);
            }
        })
        .await;

        match settled {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    "{} screen tasks still running after {:?}",
                    self.tasks.len(),
                    limit
                );
                false
            }
        }
    }

    pub fn keys_mut(&mut self) -> Option<&mut KeySubscription> {
        self.keys.as_mut()
    }
}

fn log_abnormal(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        if !e.is_cancelled() {
            debug!("Screen task ended abnormally: {}", e);
        }
    }
}

impl Drop for ScreenResources {
    fn drop(&mut self) {
        self.tasks.abort_all();
        if let Some(keys) = self.keys.take() {
            keys.unsubscribe();
        }
        debug!("Screen resources released");
    }
}
