//! Background staleness sweep for the presence table.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::tracker::PresenceTracker;

/// Configuration for the presence service.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Interval between staleness sweeps (default: 30s).
    pub sweep_interval: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl PresenceConfig {
    /// Config for testing (short interval).
    pub fn for_testing() -> Self {
        Self {
            sweep_interval: Duration::from_millis(25),
        }
    }
}

/// Owns a shared [`PresenceTracker`] and runs its staleness sweep as a
/// background task.
///
/// The sweep is separate from the read path so `status`/`is_active` stay
/// O(1), at the cost of bounded staleness (at most one sweep interval).
pub struct PresenceService {
    tracker: Arc<PresenceTracker>,
    config: PresenceConfig,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceService {
    /// Create a service around an empty tracker.
    pub fn new(config: PresenceConfig) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            tracker: Arc::new(PresenceTracker::new()),
            config,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Shared handle to the tracker, for ingestion paths and UI reads.
    pub fn tracker(&self) -> Arc<PresenceTracker> {
        Arc::clone(&self.tracker)
    }

    /// Spawn the sweep task. Calling `start` twice is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let tracker = Arc::clone(&self.tracker);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.config.sweep_interval;

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let demoted = tracker.sweep_stale();
                        if demoted > 0 {
                            tracing::debug!(demoted, "presence sweep demoted stale records");
                        }
                    }
                }
            }
            tracing::debug!("presence sweep task exited");
        }));

        tracing::info!(
            interval_ms = self.config.sweep_interval.as_millis() as u64,
            "presence service started"
        );
    }

    /// Signal shutdown and wait for the sweep task to exit.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("presence service stopped");
    }
}

impl Drop for PresenceService {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
