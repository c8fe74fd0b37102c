//! Typed codecs for the presence and expiration metadata slots.
//!
//! # Invariants
//!
//! - Slot keys are fixed: `("activity", 1)` and `("expiration", 1)`. Every
//!   use site goes through [`activity_key`]/[`expiration_key`] so the keys
//!   can never drift apart.
//! - Status encodes as base-10 integer text: `"0"` = Active, `"1"` =
//!   Inactive.
//! - Expiration encodes as an absolute RFC 3339 timestamp, never a
//!   duration. TTLs are resolved to absolute times at creation so receivers
//!   need no knowledge of transmission delay.
//! - Readers return `Ok(None)` when a slot is absent and `Err` when it is
//!   present but malformed; callers must treat the two differently (absent
//!   means "not a presence/expiring node", malformed means "log and
//!   ignore").

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::CodecError;
use crate::metadata::{Metadata, MetadataKey};

/// Presence state of an author, as claimed by a heartbeat node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresenceStatus {
    /// The author is currently connected.
    Active,
    /// The author has signed off or aged out.
    Inactive,
}

impl PresenceStatus {
    /// Encode as base-10 integer text.
    pub fn encode(self) -> Vec<u8> {
        let discriminant: i64 = match self {
            Self::Active => 0,
            Self::Inactive => 1,
        };
        discriminant.to_string().into_bytes()
    }

    /// Decode from base-10 integer text.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        match text.parse::<i64>()? {
            0 => Ok(Self::Active),
            1 => Ok(Self::Inactive),
            other => Err(CodecError::UnknownStatus(other)),
        }
    }
}

static ACTIVITY_KEY: Lazy<MetadataKey> = Lazy::new(|| MetadataKey::new("activity", 1));
static EXPIRATION_KEY: Lazy<MetadataKey> = Lazy::new(|| MetadataKey::new("expiration", 1));
static INVISIBLE_KEY: Lazy<MetadataKey> = Lazy::new(|| MetadataKey::new("invisible", 1));

/// Key of the activity status slot.
pub fn activity_key() -> &'static MetadataKey {
    &ACTIVITY_KEY
}

/// Key of the expiration slot.
pub fn expiration_key() -> &'static MetadataKey {
    &EXPIRATION_KEY
}

/// Key of the invisibility marker carried by heartbeat nodes so clients
/// don't render them as content.
pub fn invisible_key() -> &'static MetadataKey {
    &INVISIBLE_KEY
}

/// Build the activity slot for a status.
pub fn status_slot(status: PresenceStatus) -> (MetadataKey, Vec<u8>) {
    (activity_key().clone(), status.encode())
}

/// Build the expiration slot for a TTL, resolving `now + ttl` to an
/// absolute timestamp at call time.
pub fn ttl_slot(ttl: Duration) -> Result<(MetadataKey, Vec<u8>), CodecError> {
    let expires_at = OffsetDateTime::now_utc() + ttl;
    Ok((expiration_key().clone(), encode_timestamp(expires_at)?))
}

/// Encode an absolute timestamp to its canonical RFC 3339 text form.
pub fn encode_timestamp(at: OffsetDateTime) -> Result<Vec<u8>, CodecError> {
    Ok(at.format(&Rfc3339)?.into_bytes())
}

/// Decode an RFC 3339 timestamp slot value.
pub fn decode_timestamp(bytes: &[u8]) -> Result<OffsetDateTime, CodecError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(OffsetDateTime::parse(text, &Rfc3339)?)
}

/// Read the activity status slot from a node's metadata.
///
/// `Ok(None)` means the node carries no activity slot at all.
pub fn read_status(metadata: &Metadata) -> Result<Option<PresenceStatus>, CodecError> {
    match metadata.get(activity_key()) {
        Some(bytes) => Ok(Some(PresenceStatus::decode(bytes)?)),
        None => Ok(None),
    }
}

/// Read the expiration slot from a node's metadata.
///
/// `Ok(None)` means the node never expires.
pub fn read_expiration(metadata: &Metadata) -> Result<Option<OffsetDateTime>, CodecError> {
    match metadata.get(expiration_key()) {
        Some(bytes) => Ok(Some(decode_timestamp(bytes)?)),
        None => Ok(None),
    }
}

/// Build the full metadata map for a heartbeat node: activity status,
/// absolute expiration, and the invisibility marker.
pub fn activity_metadata(status: PresenceStatus, ttl: Duration) -> Result<Metadata, CodecError> {
    let mut metadata = Metadata::new();
    let (status_key, status_value) = status_slot(status);
    let (ttl_key, ttl_value) = ttl_slot(ttl)?;
    metadata.set(status_key, status_value);
    metadata.set(ttl_key, ttl_value);
    metadata.set(invisible_key().clone(), b"true".to_vec());
    Ok(metadata)
}
