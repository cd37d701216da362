//! Periodic task scheduling on the tokio runtime
//!
//! Each scheduled action gets its own interval task. The first run happens
//! immediately, later runs every `period`. Actions are synchronous and run on
//! the blocking pool, so a slow action (a database round trip) never stalls
//! the async workers. A run never overlaps the previous run of the same task.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Owner-controlled periodic timer
///
/// Tasks keep running when the scheduler itself is dropped; they end on
/// [`Scheduler::shutdown`], on [`ScheduledTask::stop`] or when their handle
/// is dropped.
#[derive(Clone)]
pub struct Scheduler {
    handle: Handle,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

/// Handle to one periodic task. Dropping it stops the task after its
/// current run.
pub struct ScheduledTask {
    name: String,
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl Scheduler {
    /// Create a scheduler bound to the current tokio runtime.
    ///
    /// Panics when called outside a runtime, like `tokio::spawn`.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    pub fn with_handle(handle: Handle) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            handle,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Run `action` now and then every `period` until stopped
    pub fn schedule_periodic<F>(&self, name: &str, period: Duration, action: F) -> ScheduledTask
    where
        F: Fn() + Send + Sync + 'static,
    {
        info!("Scheduling task '{}' (period={:?})", name, period);

        let (stop_tx, stop_rx) = watch::channel(false);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let join = self.handle.spawn(Self::run_loop(
            name.to_string(),
            period,
            Arc::new(action),
            stop_rx,
            shutdown_rx,
        ));

        ScheduledTask {
            name: name.to_string(),
            stop_tx,
            join,
        }
    }

    /// Stop every task created by this scheduler after their current run
    pub fn shutdown(&self) {
        info!("Scheduler shutting down");
        self.shutdown_tx.send_replace(true);
    }

    async fn run_loop<F>(
        name: String,
        period: Duration,
        action: Arc<F>,
        mut stop_rx: watch::Receiver<bool>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) where
        F: Fn() + Send + Sync + 'static,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;
                // A dropped task handle counts as a stop request
                _ = stop_rx.changed() => break,
                Ok(()) = shutdown_rx.changed() => break,
                _ = interval.tick() => {}
            }

            let action = Arc::clone(&action);
            if let Err(e) = tokio::task::spawn_blocking(move || action()).await {
                error!("Scheduled task '{}' failed: {}", name, e);
            }
        }

        debug!("Scheduled task '{}' terminated", name);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduledTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the task and wait for a run in progress to complete
    pub async fn stop(self) {
        self.stop_tx.send_replace(true);
        if let Err(e) = self.join.await {
            error!("Scheduled task '{}' did not stop cleanly: {}", self.name, e);
        }
    }
}
