//! Heartbeat emission.
//!
//! The emitting side of presence: a live peer announces itself to each of
//! its communities every interval, with a TTL equal to that interval, so
//! the claim ages out exactly when the next heartbeat is due. Signing off
//! emits one final Inactive announcement with a longer TTL so peers see a
//! deliberate departure instead of waiting for age-out.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use grove_core::{activity_metadata, ForestStore, NodeComposer, NodeId, PresenceStatus};

/// Configuration for heartbeat emission.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between heartbeats; also the TTL of each Active claim
    /// (default: 30s).
    pub interval: Duration,

    /// TTL of the final Inactive announcement (default: 1h).
    pub signoff_ttl: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            signoff_ttl: Duration::from_secs(3600),
        }
    }
}

impl HeartbeatConfig {
    /// Config for testing (short interval).
    pub fn for_testing() -> Self {
        Self {
            interval: Duration::from_millis(25),
            signoff_ttl: Duration::from_secs(60),
        }
    }
}

/// Periodically announces Active status to a set of communities.
pub struct HeartbeatService {
    store: Arc<dyn ForestStore>,
    composer: Arc<dyn NodeComposer>,
    communities: Vec<NodeId>,
    config: HeartbeatConfig,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatService {
    /// Create a heartbeat service for the given communities.
    pub fn new(
        store: Arc<dyn ForestStore>,
        composer: Arc<dyn NodeComposer>,
        communities: Vec<NodeId>,
        config: HeartbeatConfig,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            store,
            composer,
            communities,
            config,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Spawn the heartbeat task: one immediate round, then one per
    /// interval. Calling `start` twice is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let store = Arc::clone(&self.store);
        let composer = Arc::clone(&self.composer);
        let communities = self.communities.clone();
        let interval = self.config.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        emit_round(
                            &store,
                            &composer,
                            &communities,
                            PresenceStatus::Active,
                            interval,
                        )
                        .await;
                    }
                }
            }
            tracing::debug!("heartbeat task exited");
        }));

        tracing::info!(
            communities = self.communities.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            "heartbeat service started"
        );
    }

    /// Stop heartbeating and emit the final Inactive announcement.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.sign_off().await;
        tracing::info!("heartbeat service stopped");
    }

    /// Announce Inactive to every community with the sign-off TTL.
    pub async fn sign_off(&self) {
        emit_round(
            &self.store,
            &self.composer,
            &self.communities,
            PresenceStatus::Inactive,
            self.config.signoff_ttl,
        )
        .await;
    }
}

/// Emit one status node per community. Failures are logged and skipped;
/// one broken community must not starve the rest of the round.
async fn emit_round(
    store: &Arc<dyn ForestStore>,
    composer: &Arc<dyn NodeComposer>,
    communities: &[NodeId],
    status: PresenceStatus,
    ttl: Duration,
) {
    for community in communities {
        let metadata = match activity_metadata(status, ttl) {
            Ok(metadata) => metadata,
            Err(error) => {
                tracing::warn!(%error, "failed to build heartbeat metadata");
                continue;
            }
        };
        let node = match composer.compose_reply(community, metadata).await {
            Ok(node) => node,
            Err(error) => {
                tracing::warn!(%community, %error, "failed to compose heartbeat node");
                continue;
            }
        };
        let id = node.id;
        if let Err(error) = store.add_node(node).await {
            tracing::warn!(%community, %error, "failed to store heartbeat node");
            continue;
        }
        tracing::debug!(
            node = %id,
            %community,
            ?status,
            ttl_ms = ttl.as_millis() as u64,
            "emitted status node"
        );
    }
}
