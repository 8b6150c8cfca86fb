use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Authoring intent recorded on a member location of a derived asset.
///
/// - `BASE` (no bits set): the location follows its template.
/// - `NEW`: the location was deliberately diverged and must not be
///   overwritten by a template update.
/// - `SEALED`: the location always resyncs to its template value. Usually
///   combined with `BASE`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideFlags(u8);

impl OverrideFlags {
    pub const BASE: Self = Self(0);
    pub const NEW: Self = Self(0b01);
    pub const SEALED: Self = Self(0b10);

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The location follows its template (`NEW` is not set).
    pub const fn is_base(self) -> bool {
        self.0 & Self::NEW.0 == 0
    }

    pub const fn is_new(self) -> bool {
        self.0 & Self::NEW.0 != 0
    }

    pub const fn is_sealed(self) -> bool {
        self.0 & Self::SEALED.0 != 0
    }
}

impl BitOr for OverrideFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OverrideFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for OverrideFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OverrideFlags({self})")
    }
}

impl fmt::Display for OverrideFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = if self.is_new() { "New" } else { "Base" };
        if self.is_sealed() {
            write!(f, "{head}|Sealed")
        } else {
            f.write_str(head)
        }
    }
}
