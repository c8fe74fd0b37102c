//! Store abstraction and in-memory implementation.
//!
//! The store owns the forest. This crate consumes four operations: listing
//! recent community roots, walking a subtree pre-order, removing a subtree,
//! and adding a node. Hashing, signature verification, and replication all
//! live behind this boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, WalkError};
use crate::metadata::Metadata;
use crate::node::{Node, NodeId};

/// Visitor invoked for each node of a pre-order subtree walk.
///
/// Returning an error aborts the walk and surfaces through
/// [`ForestStore::walk_subtree`].
pub type WalkVisitor<'a> = dyn FnMut(&Node) -> Result<(), WalkError> + Send + 'a;

/// The store boundary consumed by presence tracking and expiration purging.
#[async_trait]
pub trait ForestStore: Send + Sync {
    /// List up to `limit` community roots, most recent first.
    async fn recent_communities(&self, limit: usize) -> Result<Vec<Node>, StoreError>;

    /// Walk the subtree under `root` pre-order, calling `visit` per node.
    async fn walk_subtree(
        &self,
        root: &NodeId,
        visit: &mut WalkVisitor<'_>,
    ) -> Result<(), WalkError>;

    /// Remove a node and every descendant from the store.
    async fn remove_subtree(&self, id: &NodeId) -> Result<(), StoreError>;

    /// Add a node. The node's parent, if any, must already be present.
    async fn add_node(&self, node: Node) -> Result<(), StoreError>;
}

/// Node construction seam for emitting heartbeat nodes.
///
/// Building a node involves identity and signing machinery that is an
/// external collaborator concern; services that emit nodes take a composer
/// rather than reaching for that machinery themselves.
#[async_trait]
pub trait NodeComposer: Send + Sync {
    /// Compose a reply under `community` carrying `metadata`.
    async fn compose_reply(
        &self,
        community: &NodeId,
        metadata: Metadata,
    ) -> Result<Node, StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
    /// Community roots in insertion order, oldest first.
    roots: Vec<NodeId>,
}

/// In-memory forest store for tests and local tooling.
///
/// Nodes are content-addressed, so re-adding an identical node is a no-op
/// rather than an error. Removing an id the store no longer holds is also a
/// no-op; subtree purges may race with other writers.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    /// Whether the store holds no nodes.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.nodes.is_empty()
    }

    /// Whether a node is currently held.
    pub async fn contains(&self, id: &NodeId) -> bool {
        self.inner.read().await.nodes.contains_key(id)
    }
}

#[async_trait]
impl ForestStore for MemoryStore {
    async fn recent_communities(&self, limit: usize) -> Result<Vec<Node>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .roots
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.nodes.get(id).cloned())
            .collect())
    }

    async fn walk_subtree(
        &self,
        root: &NodeId,
        visit: &mut WalkVisitor<'_>,
    ) -> Result<(), WalkError> {
        let inner = self.inner.read().await;
        if !inner.nodes.contains_key(root) {
            return Err(StoreError::NotFound(*root).into());
        }

        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            if let Some(node) = inner.nodes.get(&id) {
                visit(node)?;
            }
            if let Some(children) = inner.children.get(&id) {
                // Reversed push so the first child is visited first.
                stack.extend(children.iter().rev().copied());
            }
        }
        Ok(())
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(parent_link) = inner.nodes.get(id).map(|node| node.parent) else {
            tracing::debug!(node = %id, "remove_subtree target already gone");
            return Ok(());
        };

        let mut stack = vec![*id];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            inner.nodes.remove(&current);
            if let Some(children) = inner.children.remove(&current) {
                stack.extend(children);
            }
            removed += 1;
        }

        match parent_link {
            Some(parent) => {
                if let Some(siblings) = inner.children.get_mut(&parent) {
                    siblings.retain(|child| child != id);
                }
            }
            None => inner.roots.retain(|r| r != id),
        }

        tracing::debug!(node = %id, removed, "removed subtree");
        Ok(())
    }

    async fn add_node(&self, node: Node) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.nodes.contains_key(&node.id) {
            return Ok(());
        }
        if let Some(parent) = node.parent {
            if !inner.nodes.contains_key(&parent) {
                return Err(StoreError::MissingParent(parent));
            }
            inner.children.entry(parent).or_default().push(node.id);
        } else {
            inner.roots.push(node.id);
        }
        inner.nodes.insert(node.id, node);
        Ok(())
    }
}
