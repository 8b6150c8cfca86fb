use graft_types::{NodePath, Value};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resolution types
// ---------------------------------------------------------------------------

/// One of the two derived inputs of a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Asset1,
    Asset2,
}

/// What to do with a conflicting leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Use asset1's value silently.
    TakeAsset1,
    /// Use asset2's value silently.
    TakeAsset2,
    /// Record the conflict and continue with `fallback`'s value.
    Report { fallback: Side },
}

/// The three values in conflict at one location. Absent sides are `None`.
#[derive(Clone, Copy, Debug)]
pub struct ConflictContext<'v> {
    pub path: &'v NodePath,
    pub base: Option<&'v Value>,
    pub asset1: Option<&'v Value>,
    pub asset2: Option<&'v Value>,
}

// ---------------------------------------------------------------------------
// Policy trait
// ---------------------------------------------------------------------------

/// Strategy consulted by the materializer.
///
/// Implementations must be deterministic: merging the same inputs with the
/// same policy must always produce the same result.
pub trait MergePolicy: Send + Sync {
    /// `true` when asset2 is the updated template asset1 is being rebased
    /// onto. Lists then keep asset2's item order and append asset1's
    /// additions; otherwise asset1's order is kept.
    fn asset2_as_new_base(&self) -> bool;

    /// Decide a conflicting leaf.
    fn resolve_conflict(&self, conflict: &ConflictContext<'_>) -> Resolution;
}

// ---------------------------------------------------------------------------
// Standard policy
// ---------------------------------------------------------------------------

/// Conflict handling of a [`StandardPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum ConflictStrategy {
    /// Report every conflict and fall back to one side.
    Report { fallback: Side },
    /// Resolve every conflict in favour of one side without reporting.
    Prefer { side: Side },
}

/// Serde-configurable [`MergePolicy`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardPolicy {
    pub asset2_as_new_base: bool,
    pub on_conflict: ConflictStrategy,
}

impl Default for StandardPolicy {
    /// Rebase asset1 onto asset2; report conflicts and keep asset1's value.
    fn default() -> Self {
        Self {
            asset2_as_new_base: true,
            on_conflict: ConflictStrategy::Report {
                fallback: Side::Asset1,
            },
        }
    }
}

impl StandardPolicy {
    /// Plain two-way overlay: asset1 keeps its own list order.
    pub fn overlay() -> Self {
        Self {
            asset2_as_new_base: false,
            ..Default::default()
        }
    }

    /// Template rebase that settles every conflict in favour of `side`.
    pub fn prefer(side: Side) -> Self {
        Self {
            on_conflict: ConflictStrategy::Prefer { side },
            ..Default::default()
        }
    }
}

impl MergePolicy for StandardPolicy {
    fn asset2_as_new_base(&self) -> bool {
        self.asset2_as_new_base
    }

    fn resolve_conflict(&self, _conflict: &ConflictContext<'_>) -> Resolution {
        match self.on_conflict {
            ConflictStrategy::Report { fallback } => Resolution::Report { fallback },
            ConflictStrategy::Prefer { side: Side::Asset1 } => Resolution::TakeAsset1,
            ConflictStrategy::Prefer { side: Side::Asset2 } => Resolution::TakeAsset2,
        }
    }
}
