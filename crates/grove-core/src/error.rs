//! Error types shared across the workspace.
//!
//! Three concerns, three enums: slot decoding, store operations, and
//! subtree walks. Nothing here is process-fatal; callers log and scope the
//! failure to the smallest unit they can skip.

use thiserror::Error;

use crate::node::NodeId;

/// A metadata slot was present but could not be decoded.
///
/// Distinct from an absent slot: slot readers return `Ok(None)` for absent
/// and this error for malformed, so the two outcomes are never conflated.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Slot value is not valid UTF-8 text.
    #[error("slot value is not valid UTF-8: {0}")]
    NotText(#[from] std::str::Utf8Error),

    /// Status slot did not hold a base-10 integer.
    #[error("malformed status value: {0}")]
    MalformedStatus(#[from] std::num::ParseIntError),

    /// Status integer is outside the known enum range.
    #[error("unknown status discriminant {0}")]
    UnknownStatus(i64),

    /// Expiration slot did not hold an RFC 3339 timestamp.
    #[error("malformed expiration timestamp: {0}")]
    MalformedTimestamp(#[from] time::error::Parse),

    /// A timestamp could not be rendered to its canonical encoding.
    #[error("timestamp encoding failed: {0}")]
    EncodeTimestamp(#[from] time::error::Format),
}

/// A store operation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced node is not in the store.
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// A node referenced a parent the store does not hold.
    #[error("parent {0} not found")]
    MissingParent(NodeId),

    /// Backend failure outside this crate's taxonomy.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// A subtree walk failed or was aborted by its visitor.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The underlying store failed mid-walk.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The visitor asked to abort the walk.
    #[error("walk aborted: {0}")]
    Aborted(String),
}
