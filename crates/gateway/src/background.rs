//! Detached background work with an explicit lifetime.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

/// Tracks tasks whose completion is decoupled from any request.
///
/// `spawn` detaches a future onto the runtime; `wait_idle` resolves
/// once every spawned task has settled. The cache write on the miss
/// path goes through here so the response is never delayed by it, and
/// the binary drains the tracker on shutdown so in-flight writes are
/// not lost to process teardown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detach `task` onto the runtime and track it until it settles.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap();
        // Keep the tracker bounded between drains.
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::spawn(task));
    }

    /// Wait until every tracked task has settled, including tasks
    /// spawned while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut tasks = self.tasks.lock().unwrap();
                std::mem::take(&mut *tasks)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                // A panicked task is settled too; the JoinError is
                // irrelevant here.
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_wait_idle_sees_spawned_work() {
        let background = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            background.spawn(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        background.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_wait_idle_on_empty_tracker_returns() {
        BackgroundTasks::new().wait_idle().await;
    }

    #[tokio::test]
    async fn test_panicked_task_still_settles() {
        let background = BackgroundTasks::new();
        background.spawn(async {
            panic!("background task panic");
        });
        background.wait_idle().await;
    }
}
