//! # Grove Expiration
//!
//! Background purge of expired content. Nodes may carry an absolute
//! expiration in their metadata; once it passes, the node and its entire
//! subtree must leave the local store.
//!
//! Two pieces:
//!
//! - [`ExpirationSweeper`] — one pass: list recent communities, walk each
//!   subtree collecting expired nodes, then delete their subtrees deepest
//!   first so no surviving node references a deleted parent.
//! - [`ExpirationService`] — schedules passes: one immediately, then one
//!   per interval until shutdown.
//!
//! Deletion is local-store-only. Other replicas are unaffected, and nothing
//! here guarantees expired content is unrecoverable — that is a
//! replication-layer concern.
//!
//! The sweeper keeps no state between passes: expiry is recomputed from
//! node metadata every time, never cached, so a pass that dies partway
//! costs nothing but one cycle of latency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod service;
mod sweeper;

pub use service::{ExpirationConfig, ExpirationService};
pub use sweeper::{ExpirationSweeper, PassSummary};
