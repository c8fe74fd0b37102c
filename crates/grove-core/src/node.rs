//! Forest node model.
//!
//! Nodes are immutable and content-addressed: the id is a blake3 hash over
//! the node's fields, so two nodes with identical content share an id. This
//! crate only ever reads nodes or asks the store to delete them; nothing
//! here mutates a node after construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::metadata::Metadata;

/// Identifier of a node: a 32-byte content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(pub [u8; 32]);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", hex::encode(&self.0[..8]))
    }
}

/// Identifier of a node author: an opaque fixed-length byte identifier.
///
/// The identity scheme behind it (key hashes, signatures) is an external
/// collaborator concern; this crate treats authors as plain map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AuthorId(pub [u8; 32]);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Author({})", hex::encode(&self.0[..8]))
    }
}

/// Immutable content node in the shared forest.
///
/// `parent` is `None` for community roots and `Some` for every reply
/// beneath one. `created_at` is fixed at construction and is the ordering
/// basis for presence conflict resolution (not arrival time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Content address of this node.
    pub id: NodeId,

    /// Author that signed this node.
    pub author: AuthorId,

    /// Creation timestamp, fixed forever.
    pub created_at: OffsetDateTime,

    /// Parent node, `None` for community roots.
    pub parent: Option<NodeId>,

    /// Opaque metadata extension map.
    pub metadata: Metadata,
}

impl Node {
    /// Build a node, deriving its id from the content address of the
    /// remaining fields.
    pub fn new(
        author: AuthorId,
        created_at: OffsetDateTime,
        parent: Option<NodeId>,
        metadata: Metadata,
    ) -> Self {
        let id = content_address(&author, created_at, parent.as_ref(), &metadata);
        Self {
            id,
            author,
            created_at,
            parent,
            metadata,
        }
    }

    /// Whether this node is a community root.
    pub fn is_community(&self) -> bool {
        self.parent.is_none()
    }
}

/// Hash a node's fields into its content address.
///
/// Field order and framing are fixed; changing them changes every id.
fn content_address(
    author: &AuthorId,
    created_at: OffsetDateTime,
    parent: Option<&NodeId>,
    metadata: &Metadata,
) -> NodeId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&author.0);
    hasher.update(&created_at.unix_timestamp_nanos().to_le_bytes());
    match parent {
        Some(parent) => {
            hasher.update(&[1]);
            hasher.update(&parent.0);
        }
        None => {
            hasher.update(&[0]);
        }
    }
    for (key, value) in metadata.iter() {
        hasher.update(&(key.name.len() as u64).to_le_bytes());
        hasher.update(key.name.as_bytes());
        hasher.update(&key.version.to_le_bytes());
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value);
    }
    NodeId(*hasher.finalize().as_bytes())
}
