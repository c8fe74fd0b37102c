//! Opaque metadata extension map.
//!
//! # Invariants
//!
//! - Keys are `(name, version)` pairs; the same name may exist at several
//!   versions side by side.
//! - Values are raw bytes. Interpretation belongs to the slot codecs in
//!   [`crate::codec`], never to this map.
//! - Iteration order is deterministic (keys sort by name, then version) so
//!   content addressing over the map is stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of one metadata extension slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MetadataKey {
    /// Slot name, e.g. `"activity"`.
    pub name: String,
    /// Slot schema version.
    pub version: u32,
}

impl MetadataKey {
    /// Create a slot key.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// A node's metadata: `(name, version) -> bytes`.
///
/// The map is a generic extensibility mechanism owned by the store's node
/// format; this core reads and writes individual slots through the typed
/// accessors in [`crate::codec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata(BTreeMap<MetadataKey, Vec<u8>>);

impl Metadata {
    /// Create an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a slot, if present.
    pub fn get(&self, key: &MetadataKey) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Set a slot, replacing any previous value.
    pub fn set(&mut self, key: MetadataKey, value: Vec<u8>) {
        self.0.insert(key, value);
    }

    /// Whether a slot is present.
    pub fn contains(&self, key: &MetadataKey) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate slots in deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MetadataKey, &Vec<u8>)> {
        self.0.iter()
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no slots.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
