//! Purge behavior over an in-memory forest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use grove_core::{
    encode_timestamp, expiration_key, AuthorId, ForestStore, MemoryStore, Metadata, Node, NodeId,
    StoreError, WalkError, WalkVisitor,
};
use grove_expiration::{ExpirationConfig, ExpirationService, ExpirationSweeper};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn expiring_metadata(expires_at: OffsetDateTime) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.set(expiration_key().clone(), encode_timestamp(expires_at).unwrap());
    metadata
}

async fn add(store: &dyn ForestStore, author: u8, secs: i64, parent: Option<NodeId>, metadata: Metadata) -> NodeId {
    let node = Node::new(
        AuthorId([author; 32]),
        OffsetDateTime::from_unix_timestamp(secs).unwrap(),
        parent,
        metadata,
    );
    let id = node.id;
    store.add_node(node).await.unwrap();
    id
}

fn past() -> OffsetDateTime {
    OffsetDateTime::now_utc() - Duration::from_secs(60)
}

fn future() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::from_secs(3600)
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_subtree_goes_including_unexpired_children() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let root = add(store.as_ref(), 1, 100, None, Metadata::new()).await;
    let expired = add(store.as_ref(), 2, 200, Some(root), expiring_metadata(past())).await;
    let child = add(store.as_ref(), 3, 300, Some(expired), Metadata::new()).await;
    let untouched = add(store.as_ref(), 4, 400, Some(root), expiring_metadata(future())).await;

    let other_root = add(store.as_ref(), 5, 500, None, Metadata::new()).await;
    let other_reply = add(store.as_ref(), 6, 600, Some(other_root), Metadata::new()).await;

    let sweeper = ExpirationSweeper::new(store.clone(), 32);
    let summary = sweeper.run_once().await.unwrap();

    assert_eq!(summary.communities, 2);
    assert_eq!(summary.subtrees_removed, 1);
    assert_eq!(summary.communities_failed, 0);

    assert!(!store.contains(&expired).await);
    assert!(!store.contains(&child).await);
    assert!(store.contains(&root).await);
    assert!(store.contains(&untouched).await);
    assert!(store.contains(&other_root).await);
    assert!(store.contains(&other_reply).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn nested_expired_nodes_are_removed_deepest_first() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    // Expired node with an expired descendant two levels down; reverse
    // discovery order must remove the descendant's subtree before the
    // ancestor's without erroring.
    let root = add(store.as_ref(), 1, 100, None, Metadata::new()).await;
    let outer = add(store.as_ref(), 2, 200, Some(root), expiring_metadata(past())).await;
    let middle = add(store.as_ref(), 3, 300, Some(outer), Metadata::new()).await;
    let inner = add(store.as_ref(), 4, 400, Some(middle), expiring_metadata(past())).await;
    let leaf = add(store.as_ref(), 5, 500, Some(inner), Metadata::new()).await;

    let sweeper = ExpirationSweeper::new(store.clone(), 32);
    let summary = sweeper.run_once().await.unwrap();

    assert_eq!(summary.communities_failed, 0);
    for id in [outer, middle, inner, leaf] {
        assert!(!store.contains(&id).await);
    }
    assert!(store.contains(&root).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupt_expiration_slot_fails_open() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let root = add(store.as_ref(), 1, 100, None, Metadata::new()).await;
    let mut corrupt = Metadata::new();
    corrupt.set(expiration_key().clone(), b"not a timestamp".to_vec());
    let kept = add(store.as_ref(), 2, 200, Some(root), corrupt).await;
    let removed = add(store.as_ref(), 3, 300, Some(root), expiring_metadata(past())).await;

    let sweeper = ExpirationSweeper::new(store.clone(), 32);
    let summary = sweeper.run_once().await.unwrap();

    assert_eq!(summary.subtrees_removed, 1);
    assert!(store.contains(&kept).await);
    assert!(!store.contains(&removed).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn community_limit_bounds_the_pass() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    // Oldest community falls outside a limit of 2 and keeps its expired node.
    let old_root = add(store.as_ref(), 1, 100, None, Metadata::new()).await;
    let old_expired = add(store.as_ref(), 2, 150, Some(old_root), expiring_metadata(past())).await;
    let mid_root = add(store.as_ref(), 3, 200, None, Metadata::new()).await;
    let mid_expired = add(store.as_ref(), 4, 250, Some(mid_root), expiring_metadata(past())).await;
    let new_root = add(store.as_ref(), 5, 300, None, Metadata::new()).await;
    let new_expired = add(store.as_ref(), 6, 350, Some(new_root), expiring_metadata(past())).await;

    let sweeper = ExpirationSweeper::new(store.clone(), 2);
    let summary = sweeper.run_once().await.unwrap();

    assert_eq!(summary.communities, 2);
    assert!(store.contains(&old_expired).await);
    assert!(!store.contains(&mid_expired).await);
    assert!(!store.contains(&new_expired).await);
}

/// Store wrapper that injects failures for specific operations.
struct FaultyStore {
    inner: MemoryStore,
    fail_listing: bool,
    fail_removal_of: Option<NodeId>,
}

#[async_trait]
impl ForestStore for FaultyStore {
    async fn recent_communities(&self, limit: usize) -> Result<Vec<Node>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Backend("listing unavailable".to_string()));
        }
        self.inner.recent_communities(limit).await
    }

    async fn walk_subtree(
        &self,
        root: &NodeId,
        visit: &mut WalkVisitor<'_>,
    ) -> Result<(), WalkError> {
        self.inner.walk_subtree(root, visit).await
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), StoreError> {
        if self.fail_removal_of == Some(*id) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.remove_subtree(id).await
    }

    async fn add_node(&self, node: Node) -> Result<(), StoreError> {
        self.inner.add_node(node).await
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_failure_aborts_the_pass() {
    init_tracing();
    let store = Arc::new(FaultyStore {
        inner: MemoryStore::new(),
        fail_listing: true,
        fail_removal_of: None,
    });

    let sweeper = ExpirationSweeper::new(store, 32);
    assert!(sweeper.run_once().await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn removal_failure_skips_that_subtree_only() {
    init_tracing();
    let inner = MemoryStore::new();

    let stuck_root = add(&inner, 1, 100, None, Metadata::new()).await;
    let stuck = add(&inner, 2, 200, Some(stuck_root), expiring_metadata(past())).await;
    let ok_root = add(&inner, 3, 300, None, Metadata::new()).await;
    let ok_expired = add(&inner, 4, 400, Some(ok_root), expiring_metadata(past())).await;

    let store = Arc::new(FaultyStore {
        inner,
        fail_listing: false,
        fail_removal_of: Some(stuck),
    });

    let sweeper = ExpirationSweeper::new(store.clone(), 32);
    let summary = sweeper.run_once().await.unwrap();

    assert_eq!(summary.subtrees_removed, 1);
    assert!(store.inner.contains(&stuck).await);
    assert!(!store.inner.contains(&ok_expired).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn service_runs_an_immediate_pass_and_stops_cleanly() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());

    let root = add(store.as_ref(), 1, 100, None, Metadata::new()).await;
    let expired = add(store.as_ref(), 2, 200, Some(root), expiring_metadata(past())).await;

    let service = ExpirationService::new(store.clone(), ExpirationConfig::for_testing());
    service.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.stop().await;

    assert!(!store.contains(&expired).await);
    assert!(store.contains(&root).await);

    // Nodes expiring after shutdown linger until someone runs a pass.
    let late = add(store.as_ref(), 3, 300, Some(root), expiring_metadata(past())).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.contains(&late).await);

    let summary = service.sweeper().run_once().await.unwrap();
    assert_eq!(summary.subtrees_removed, 1);
    assert!(!store.contains(&late).await);
}
