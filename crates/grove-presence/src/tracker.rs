//! The presence table and its conflict-resolution rule.
//!
//! # Blocking lock usage
//!
//! The table is a `parking_lot::RwLock<HashMap>`: reads are
//! `status`/`is_active`, writes are `handle_node` and `sweep_stale`. The
//! lock is never held across an await point; every critical section is a
//! handful of map operations.

use std::collections::HashMap;

use parking_lot::RwLock;
use time::OffsetDateTime;

use grove_core::{read_expiration, read_status, AuthorId, Node, PresenceStatus};

/// Stored presence claim for one author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceRecord {
    /// Claimed status.
    pub status: PresenceStatus,
    /// Creation time of the heartbeat node that installed this record.
    /// Monotonically non-decreasing across updates for a given author.
    pub created_at: OffsetDateTime,
    /// When the claim stops being valid.
    pub expires_at: OffsetDateTime,
}

/// Maps authors to their current presence state.
///
/// Records are installed only through [`handle_node`](Self::handle_node),
/// so every stored claim went through the same validation. Status queries
/// never materialize records; unknown authors read as Inactive.
#[derive(Default)]
pub struct PresenceTracker {
    records: RwLock<HashMap<AuthorId, PresenceRecord>>,
}

impl PresenceTracker {
    /// Create an empty tracker. Every author starts Inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a node, updating the table if it is a valid heartbeat.
    ///
    /// Most nodes are not heartbeats; those return silently. A heartbeat
    /// missing its expiration slot is a sender policy violation and is
    /// dropped. Malformed slot values are logged and dropped. None of these
    /// outcomes surface to the caller.
    pub fn handle_node(&self, node: &Node) {
        let status = match read_status(&node.metadata) {
            Ok(Some(status)) => status,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "unreadable activity slot, ignoring node");
                return;
            }
        };

        let expires_at = match read_expiration(&node.metadata) {
            Ok(Some(expires_at)) => expires_at,
            Ok(None) => {
                tracing::debug!(
                    node = %node.id,
                    author = %node.author,
                    "heartbeat carries no expiration slot, ignoring node"
                );
                return;
            }
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "unreadable expiration slot, ignoring node");
                return;
            }
        };

        tracing::debug!(author = %node.author, ?status, "observed heartbeat");
        self.apply(node.author, status, node.created_at, expires_at);
    }

    /// Apply the conflict-resolution rule.
    ///
    /// Private so every installed record went through `handle_node`. A
    /// claim is rejected if it has already expired, or if the stored record
    /// was created later than it (last-writer-wins by node creation time,
    /// which handles out-of-order delivery).
    fn apply(
        &self,
        author: AuthorId,
        status: PresenceStatus,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) {
        if OffsetDateTime::now_utc() > expires_at {
            tracing::debug!(%author, "heartbeat already expired, not installing");
            return;
        }

        let mut records = self.records.write();
        if let Some(existing) = records.get(&author) {
            if existing.created_at > created_at {
                tracing::debug!(%author, "stale heartbeat superseded by newer record");
                return;
            }
        }
        records.insert(
            author,
            PresenceRecord {
                status,
                created_at,
                expires_at,
            },
        );
    }

    /// Current status of an author. Unknown authors are Inactive.
    pub fn status(&self, author: &AuthorId) -> PresenceStatus {
        self.records
            .read()
            .get(author)
            .map_or(PresenceStatus::Inactive, |record| record.status)
    }

    /// Whether an author is currently Active.
    pub fn is_active(&self, author: &AuthorId) -> bool {
        self.status(author) == PresenceStatus::Active
    }

    /// Demote every record whose expiration has passed to Inactive.
    ///
    /// Records are never deleted, and `created_at`/`expires_at` stay
    /// untouched, so a later fresher heartbeat can still re-promote and the
    /// creation-time comparison stays correct. Returns how many records
    /// were demoted.
    pub fn sweep_stale(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut demoted = 0;
        let mut records = self.records.write();
        for record in records.values_mut() {
            if now > record.expires_at && record.status == PresenceStatus::Active {
                record.status = PresenceStatus::Inactive;
                demoted += 1;
            }
        }
        demoted
    }

    /// Number of authors with a stored record.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of one author's record, if any. Test and debugging aid.
    pub fn record(&self, author: &AuthorId) -> Option<PresenceRecord> {
        self.records.read().get(author).copied()
    }
}
