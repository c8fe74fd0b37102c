//! # Grove Core
//!
//! Foundation types for the Grove forest: the immutable content-addressed
//! node model, the opaque `(name, version) -> bytes` metadata extension map,
//! the presence/expiration slot codec, and the store abstraction the
//! background services run against.
//!
//! This crate holds no background tasks and no policy. Presence tracking
//! lives in `grove-presence`, subtree purging in `grove-expiration`; both
//! consume the traits and codecs defined here.
//!
//! ## Core concepts
//!
//! - **Node**: immutable, content-addressed unit in the shared tree. Carries
//!   author, creation timestamp, parent link, and a metadata map.
//! - **Metadata slot**: a `(name, version)` keyed byte entry used to attach
//!   optional typed data (activity status, expiration) without changing the
//!   node format. Slot readers distinguish "absent" (`Ok(None)`) from
//!   "present but malformed" (`Err`).
//! - **ForestStore**: the async store boundary — list community roots, walk
//!   a subtree pre-order, remove a subtree, add a node. `MemoryStore` is the
//!   in-process implementation used by tests and local tooling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod metadata;
pub mod node;
pub mod store;

pub use codec::{
    activity_key, activity_metadata, decode_timestamp, encode_timestamp, expiration_key,
    invisible_key, read_expiration, read_status, status_slot, ttl_slot, PresenceStatus,
};
pub use error::{CodecError, StoreError, WalkError};
pub use metadata::{Metadata, MetadataKey};
pub use node::{AuthorId, Node, NodeId};
pub use store::{ForestStore, MemoryStore, NodeComposer, WalkVisitor};
