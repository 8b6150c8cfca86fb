use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Stable identifier carried by list items.
///
/// Items that expose an `ItemId` are reconciled by identity rather than by
/// position, so reordering, insertion and removal on either derived side can
/// be told apart from in-place edits. Ids are UUIDs; freshly minted ids are
/// time-ordered (v7).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

/// High bits reserved for ids synthesized from a list position.
const SYNTHETIC_PREFIX: u128 = 0xffff_ffff << 96;

impl ItemId {
    /// Mint a new, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Build an id from a raw 128-bit value. Handy for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Id standing in for a null list item at `index`.
    ///
    /// Null items have nothing to read an id from; deriving one from the
    /// position makes nulls at the same index on every side correspond.
    pub fn synthetic(index: usize) -> Self {
        Self(Uuid::from_u128(SYNTHETIC_PREFIX | index as u128))
    }

    /// Returns `true` if this id was produced by [`ItemId::synthetic`].
    pub fn is_synthetic(&self) -> bool {
        self.0.as_u128() & SYNTHETIC_PREFIX == SYNTHETIC_PREFIX
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        let simple = self.0.simple().to_string();
        format!("id:{}", &simple[..8])
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ItemId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.short_id())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
