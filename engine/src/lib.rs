//! # lofi-sync
//!
//! Field-level conflict resolution for offline-first Kanban cards.
//!
//! A card can be edited locally while offline and changed remotely at the same
//! time. Given both versions, this crate produces one merged card and says
//! whether the two sides collided.
//!
//! ## Design Principles
//!
//! - **No IO**: the merge never touches files, network, or platform
//! - **Deterministic**: same inputs always produce the same output
//! - **Field-level**: edits to different fields never conflict
//! - **Local intent wins**: a conflicting field keeps the local value and the
//!   card is flagged for the user
//!
//! ## Core Concepts
//!
//! ### Dirty fields and the sync snapshot
//!
//! Every [`Card`] carries a [`FieldSet`] of fields edited locally since the
//! last sync, and a [`SyncSnapshot`] of the values as they were at that sync.
//! The snapshot is the common ancestor used to tell whether the remote side
//! changed a field.
//!
//! ### Merge
//!
//! [`merge_cards`] (or [`Resolver::resolve`] for a per-field report) walks every
//! [`MutableField`]:
//! - clean locally, changed remotely: the remote value is taken
//! - dirty locally, changed remotely: local value kept, card marked
//!   [`SyncStatus::Conflict`]
//! - otherwise the local value stays
//!
//! A card with no dirty fields is simply replaced by the remote one.
//!
//! ### Equality
//!
//! [`values_equal`] treats a missing value and `null` as the same, compares
//! lists in order and numbers by value.
//!
//! ## Quick Start
//!
//! ```rust
//! use lofi_sync::{merge_cards, Card, ColumnId, MutableField, SyncSnapshot, SyncStatus};
//! use chrono::{TimeZone, Utc};
//! use serde_json::json;
//!
//! let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
//!
//! // Local edited the title since the last sync
//! let local = Card::new("card-1", "Local Title", at)
//!     .with_dirty_fields([MutableField::Title])
//!     .with_snapshot(
//!         SyncSnapshot::new()
//!             .with(MutableField::Title, json!("Original"))
//!             .with(MutableField::Status, json!("todo")),
//!     );
//!
//! // Remote moved the card to done
//! let remote = Card::new("card-1", "Original", at).with_status(ColumnId::Done);
//!
//! let merged = merge_cards(&local, &remote);
//! assert_eq!(merged.title, "Local Title");
//! assert_eq!(merged.status, ColumnId::Done);
//! assert_ne!(merged.sync_status, Some(SyncStatus::Conflict));
//! ```
//!
//! ## Boundary
//!
//! The merge assumes well-formed cards. [`Card::from_json`] validates a
//! payload against [`CardSchema`] first. [`CardStore`] is an in-memory handle
//! that runs the local-edit / merge / acknowledge lifecycle around the merge.
//!
//! ## FFI
//!
//! The [`ffi`] module provides C-compatible functions for use from other
//! languages. All data is exchanged as JSON strings.

pub mod card;
pub mod config;
pub mod equality;
pub mod error;
pub mod ffi;
pub mod field;
pub mod merge;
pub mod schema;
pub mod store;

// Re-export main types at crate root
pub use card::{Card, CardId, ColumnId, Priority, SyncSnapshot, SyncStatus};
pub use config::{ConfigError, FirstSyncPolicy, MergeConfig};
pub use equality::values_equal;
pub use error::Error;
pub use field::{FieldSet, MutableField};
pub use merge::{merge_cards, FieldResolution, MergeOutcome, Resolver};
pub use schema::{CardSchema, FieldDef, FieldType};
pub use store::CardStore;

/// Point in time used for `createdAt`/`updatedAt`.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
