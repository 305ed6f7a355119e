//! Field-level merge of a local card against its remote counterpart.
//!
//! # Algorithm
//!
//! 1. If the local card has no dirty fields, the remote card is returned as-is.
//! 2. Otherwise start from a copy of the local card and, for every mutable
//!    field, decide using the local dirty set and whether the remote value
//!    moved away from the sync snapshot:
//!
//!    | dirty | remote changed | result                      |
//!    |-------|----------------|-----------------------------|
//!    | no    | yes            | take remote value           |
//!    | yes   | yes            | keep local, flag conflict   |
//!    | yes   | no             | keep local (pending push)   |
//!    | no    | no             | keep local (same as remote) |
//!
//!    Without a snapshot the remote counts as unchanged for every field.
//! 3. `updatedAt` becomes the remote one if any field was taken from the
//!    remote or the remote is strictly newer.
//! 4. Any conflict sets `syncStatus` to `conflict`; otherwise the local status
//!    is kept.
//!
//! `dirtyFields` and `syncSnapshot` are carried over from the local card
//! untouched. Clearing them is up to the sync driver once the result has
//! been pushed.
//!
//! Callers must pass two versions of the same card. Mismatched ids are not
//! checked and give an unspecified result.

use crate::{
    equality::values_equal, Card, FieldSet, FirstSyncPolicy, MergeConfig, MutableField,
    SyncStatus,
};
use serde::{Deserialize, Serialize};

/// How a single field was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldResolution {
    /// Neither side changed it
    Unchanged,
    /// Local edit kept, remote untouched
    KeptLocal,
    /// Clean locally, remote value taken
    AdoptedRemote,
    /// Changed on both sides; local value kept
    Conflict,
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// The merged card
    pub card: Card,
    /// True when the local card was clean and the remote was taken whole
    pub fast_path: bool,
    /// Fields taken from the remote card
    pub adopted: FieldSet,
    /// Fields changed on both sides
    pub conflicts: FieldSet,
    /// Dirty fields kept without remote interference
    pub pending: FieldSet,
}

impl MergeOutcome {
    pub(crate) fn passthrough(card: Card) -> Self {
        Self {
            card,
            fast_path: true,
            adopted: FieldSet::new(),
            conflicts: FieldSet::new(),
            pending: FieldSet::new(),
        }
    }

    /// True when at least one field collided.
    pub fn is_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// How `field` was resolved. Fields replaced wholesale on the fast path
    /// report `Unchanged`.
    pub fn resolution(&self, field: MutableField) -> FieldResolution {
        if self.conflicts.contains(field) {
            FieldResolution::Conflict
        } else if self.adopted.contains(field) {
            FieldResolution::AdoptedRemote
        } else if self.pending.contains(field) {
            FieldResolution::KeptLocal
        } else {
            FieldResolution::Unchanged
        }
    }

    /// Take the merged card.
    pub fn into_card(self) -> Card {
        self.card
    }
}

/// Merges local and remote versions of a card.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: MergeConfig,
}

impl Resolver {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge and return only the card.
    pub fn merge(&self, local: &Card, remote: &Card) -> Card {
        self.resolve(local, remote).into_card()
    }

    /// Merge and report how each field was resolved.
    pub fn resolve(&self, local: &Card, remote: &Card) -> MergeOutcome {
        let _span = tracing::debug_span!("merge", card = %local.id).entered();

        if local.is_clean() {
            tracing::debug!("local card clean, taking remote");
            return MergeOutcome::passthrough(remote.clone());
        }

        let snapshot = local.sync_snapshot.as_ref();
        let mut merged = local.clone();
        let mut adopted = FieldSet::new();
        let mut conflicts = FieldSet::new();
        let mut pending = FieldSet::new();

        for field in MutableField::ALL {
            let is_dirty = local.dirty_fields.contains(field);
            let remote_value = remote.field_value(field);
            let remote_changed = match snapshot {
                Some(snapshot) => !values_equal(remote_value.as_ref(), snapshot.get(field)),
                None => false,
            };

            let resolution = match (is_dirty, remote_changed) {
                (false, true) => {
                    merged.adopt_field(remote, field);
                    adopted.insert(field);
                    FieldResolution::AdoptedRemote
                }
                (true, true) => {
                    conflicts.insert(field);
                    FieldResolution::Conflict
                }
                (true, false) => {
                    if snapshot.is_none()
                        && self.flags_first_sync(local, field, remote_value.as_ref())
                    {
                        conflicts.insert(field);
                        FieldResolution::Conflict
                    } else {
                        pending.insert(field);
                        FieldResolution::KeptLocal
                    }
                }
                (false, false) => FieldResolution::Unchanged,
            };
            tracing::trace!(%field, ?resolution, "field resolved");
        }

        if !adopted.is_empty() || remote.updated_at > local.updated_at {
            merged.updated_at = remote.updated_at;
        }

        if !conflicts.is_empty() {
            merged.sync_status = Some(SyncStatus::Conflict);
        }

        tracing::debug!(?adopted, ?conflicts, ?pending, "merge complete");

        MergeOutcome {
            card: merged,
            fast_path: false,
            adopted,
            conflicts,
            pending,
        }
    }

    fn flags_first_sync(
        &self,
        local: &Card,
        field: MutableField,
        remote_value: Option<&serde_json::Value>,
    ) -> bool {
        self.config.first_sync == FirstSyncPolicy::FlagConflict
            && !values_equal(local.field_value(field).as_ref(), remote_value)
    }
}

/// Merge with the default configuration.
pub fn merge_cards(local: &Card, remote: &Card) -> Card {
    Resolver::default().merge(local, remote)
}
