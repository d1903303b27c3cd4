//! Background worker for periodic and on-demand maintenance tasks.
//!
//! A [`BackgroundWorker`] owns one tokio task that feeds queued tasks to a
//! [`BackgroundRunnable`] one at a time and calls its tick hook on a fixed
//! interval. Tasks are processed strictly in submission order.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

/// Task handler executed by a [`BackgroundWorker`].
#[async_trait]
pub trait BackgroundRunnable: Send + 'static {
    type Task: Send + 'static;

    /// Process a single task.
    async fn run(&mut self, task: Self::Task);

    /// Called on each tick interval. Default is a no-op.
    async fn on_tick(&mut self) {}

    /// Called once when the worker stops. Default is a no-op.
    async fn shutdown(&mut self) {}
}

/// Errors returned by [`BackgroundWorker::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    #[error("worker not running")]
    Stopped,
    #[error("worker channel closed")]
    Closed,
}

/// Handle to a running background task.
pub struct BackgroundWorker<R: BackgroundRunnable> {
    tx: Option<mpsc::Sender<R::Task>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl<R: BackgroundRunnable> BackgroundWorker<R> {
    /// Spawns the worker loop.
    ///
    /// `queue_capacity` bounds the number of pending tasks; `submit` waits
    /// while the queue is full.
    pub fn start(mut runnable: R, tick_interval: Duration, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<R::Task>(queue_capacity.max(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    task = rx.recv() => match task {
                        Some(task) => runnable.run(task).await,
                        None => break,
                    },
                    _ = ticker.tick() => runnable.on_tick().await,
                    _ = &mut shutdown_rx => break,
                }
            }

            runnable.shutdown().await;
        });

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Queues a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] if the worker has been stopped.
    pub async fn submit(&self, task: R::Task) -> Result<(), WorkerError> {
        match &self.tx {
            Some(tx) => tx.send(task).await.map_err(|_| WorkerError::Closed),
            None => Err(WorkerError::Stopped),
        }
    }

    /// Stops the worker and waits for its task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Counters {
        seen: Mutex<Vec<u32>>,
        ticks: AtomicU32,
        shutdowns: AtomicU32,
    }

    struct RecordingRunnable(Arc<Counters>);

    #[async_trait]
    impl BackgroundRunnable for RecordingRunnable {
        type Task = u32;

        async fn run(&mut self, task: u32) {
            self.0.seen.lock().push(task);
        }

        async fn on_tick(&mut self) {
            self.0.ticks.fetch_add(1, Ordering::SeqCst);
        }

        async fn shutdown(&mut self) {
            self.0.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn processes_tasks_in_order_then_shuts_down() {
        let counters = Arc::new(Counters::default());
        let mut worker = BackgroundWorker::start(
            RecordingRunnable(counters.clone()),
            Duration::from_secs(60),
            8,
        );

        for task in 1..=3 {
            worker.submit(task).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        worker.stop().await;

        assert_eq!(*counters.seen.lock(), vec![1, 2, 3]);
        assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_fires_periodically() {
        let counters = Arc::new(Counters::default());
        let mut worker = BackgroundWorker::start(
            RecordingRunnable(counters.clone()),
            Duration::from_millis(20),
            8,
        );

        tokio::time::sleep(Duration::from_millis(110)).await;
        worker.stop().await;

        assert!(counters.ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn submit_after_stop_fails() {
        let mut worker = BackgroundWorker::start(
            RecordingRunnable(Arc::new(Counters::default())),
            Duration::from_secs(60),
            8,
        );
        worker.stop().await;
        assert_eq!(worker.submit(1).await, Err(WorkerError::Stopped));
    }
}
