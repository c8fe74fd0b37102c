//! Purge pass scheduling.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use grove_core::ForestStore;

use crate::sweeper::ExpirationSweeper;

/// Configuration for the expiration service.
#[derive(Debug, Clone)]
pub struct ExpirationConfig {
    /// Interval between purge passes (default: 10m).
    pub purge_interval: Duration,

    /// How many recent communities each pass visits (default: 32).
    pub community_limit: usize,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            purge_interval: Duration::from_secs(600),
            community_limit: 32,
        }
    }
}

impl ExpirationConfig {
    /// Config for testing (short interval).
    pub fn for_testing() -> Self {
        Self {
            purge_interval: Duration::from_millis(25),
            community_limit: 32,
        }
    }
}

/// Runs purge passes on a fixed interval as a background task.
///
/// The first pass runs immediately on start. A failed pass is logged and
/// the schedule continues; only the shutdown signal stops it. Passes never
/// overlap because the single task awaits each pass before ticking again.
pub struct ExpirationService {
    sweeper: Arc<ExpirationSweeper>,
    config: ExpirationConfig,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirationService {
    /// Create a service sweeping `store`.
    pub fn new(store: Arc<dyn ForestStore>, config: ExpirationConfig) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            sweeper: Arc::new(ExpirationSweeper::new(store, config.community_limit)),
            config,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Handle to the underlying sweeper, for on-demand passes.
    pub fn sweeper(&self) -> Arc<ExpirationSweeper> {
        Arc::clone(&self.sweeper)
    }

    /// Spawn the purge task. Calling `start` twice is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let sweeper = Arc::clone(&self.sweeper);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.config.purge_interval;

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(error) = sweeper.run_once().await {
                            tracing::warn!(%error, "purge pass aborted, retrying next tick");
                        }
                    }
                }
            }
            tracing::debug!("purge task exited");
        }));

        tracing::info!(
            interval_ms = self.config.purge_interval.as_millis() as u64,
            community_limit = self.config.community_limit,
            "expiration service started"
        );
    }

    /// Signal shutdown and wait for the purge task to exit. An in-flight
    /// pass finishes; no further ticks are scheduled.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("expiration service stopped");
    }
}

impl Drop for ExpirationService {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
