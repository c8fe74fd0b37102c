//! # Grove Presence
//!
//! Per-author presence derived from heartbeat nodes. A live peer emits a
//! node every interval whose metadata claims a status (Active/Inactive) and
//! an absolute expiration; this crate folds those claims into an in-memory
//! table and ages them out when their TTL passes.
//!
//! Status is derived, never commanded: a peer cannot claim "active forever"
//! because every claim carries an expiration, so crashed peers and network
//! partitions naturally decay to Inactive without a leave message.
//!
//! Three pieces:
//!
//! - [`PresenceTracker`] — the table itself: `handle_node` ingestion with
//!   last-writer-wins-by-creation-time conflict resolution, O(1)
//!   `status`/`is_active` reads, and a `sweep_stale` demotion pass.
//! - [`PresenceService`] — runs the staleness sweep on an interval as a
//!   background task with cooperative shutdown.
//! - [`HeartbeatService`] — the emitting side: periodic Active heartbeats
//!   per community, and a final Inactive announcement on sign-off.
//!
//! The table is pure runtime state. It is not persisted and is not rebuilt
//! from history; after a restart every author reads Inactive until a fresh
//! heartbeat arrives.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod heartbeat;
mod service;
mod tracker;

pub use heartbeat::{HeartbeatConfig, HeartbeatService};
pub use service::{PresenceConfig, PresenceService};
pub use tracker::{PresenceRecord, PresenceTracker};
