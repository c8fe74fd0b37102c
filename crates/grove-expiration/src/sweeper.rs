//! One purge pass over the forest.

use std::sync::Arc;

use time::OffsetDateTime;

use grove_core::{read_expiration, ForestStore, Node, NodeId, StoreError, WalkError};

/// Outcome of one purge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Communities visited.
    pub communities: usize,
    /// Expired subtree roots removed.
    pub subtrees_removed: usize,
    /// Communities skipped because their walk or deletion failed.
    pub communities_failed: usize,
}

/// Walks recent communities and removes expired subtrees.
///
/// Stateless between passes apart from the store handle and the listing
/// bound; every pass re-reads expiry from node metadata.
pub struct ExpirationSweeper {
    store: Arc<dyn ForestStore>,
    community_limit: usize,
}

impl ExpirationSweeper {
    /// Create a sweeper over `store`, visiting at most `community_limit`
    /// recent communities per pass.
    pub fn new(store: Arc<dyn ForestStore>, community_limit: usize) -> Self {
        Self {
            store,
            community_limit,
        }
    }

    /// Run one purge pass.
    ///
    /// A failure listing communities aborts the whole pass and surfaces as
    /// `Err`; the caller's schedule retries from scratch next tick. A
    /// failure within one community (walk or deletion) is logged, counted,
    /// and the pass moves on to the next community.
    pub async fn run_once(&self) -> Result<PassSummary, StoreError> {
        let communities = self.store.recent_communities(self.community_limit).await?;

        let mut summary = PassSummary {
            communities: communities.len(),
            ..PassSummary::default()
        };

        for community in &communities {
            match self.purge_community(community).await {
                Ok(removed) => summary.subtrees_removed += removed,
                Err(error) => {
                    summary.communities_failed += 1;
                    tracing::warn!(
                        community = %community.id,
                        %error,
                        "skipping community after failed purge"
                    );
                }
            }
        }

        if summary.subtrees_removed > 0 {
            tracing::info!(
                communities = summary.communities,
                removed = summary.subtrees_removed,
                "purge pass removed expired subtrees"
            );
        }
        Ok(summary)
    }

    /// Purge one community: collect expired nodes during a pre-order walk,
    /// then delete their subtrees in reverse discovery order.
    ///
    /// Discovery and deletion never interleave; the walk sees a structure
    /// this pass has not yet mutated, and reverse order guarantees a
    /// deeper expired node is gone before any ancestor of it is removed.
    async fn purge_community(&self, community: &Node) -> Result<usize, WalkError> {
        let now = OffsetDateTime::now_utc();
        let mut expired: Vec<NodeId> = Vec::new();

        self.store
            .walk_subtree(&community.id, &mut |node| {
                match read_expiration(&node.metadata) {
                    Ok(Some(expires_at)) if now > expires_at => expired.push(node.id),
                    Ok(_) => {}
                    // Fail open: a corrupt slot must not cascade into
                    // deleting content that never asked to expire.
                    Err(error) => {
                        tracing::warn!(
                            node = %node.id,
                            %error,
                            "unreadable expiration slot, treating node as non-expiring"
                        );
                    }
                }
                Ok(())
            })
            .await?;

        let mut removed = 0;
        for id in expired.iter().rev() {
            match self.store.remove_subtree(id).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(node = %id, community = %community.id, "removed expired subtree");
                }
                Err(error) => {
                    tracing::warn!(node = %id, %error, "failed to remove expired subtree, skipping");
                }
            }
        }
        Ok(removed)
    }
}
