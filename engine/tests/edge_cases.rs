//! Edge case tests for lofi-sync
//!
//! These tests cover boundary conditions and unusual inputs.

use chrono::{TimeZone, Utc};
use lofi_sync::{
    merge_cards, values_equal, Card, CardId, CardStore, Error, FieldSet, MutableField,
    SyncSnapshot, SyncStatus, Timestamp,
};
use serde_json::json;

fn ts(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn synced(card: Card) -> Card {
    let snapshot = SyncSnapshot::capture(&card);
    card.with_snapshot(snapshot)
        .with_sync_status(SyncStatus::Synced)
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_titles() {
    let titles = vec![
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Hello\nWorld\tTab",
    ];

    for title in titles {
        let base = synced(Card::new("c1", "Original", ts(0)));
        let mut local = base.clone();
        local.title = title.to_string();
        local.dirty_fields.insert(MutableField::Title);

        let merged = merge_cards(&local, &base);
        assert_eq!(merged.title, title, "Failed for: {}", title);
        assert!(!merged.is_conflict());

        let reparsed = Card::from_json(&merged.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.title, title);
    }
}

#[test]
fn empty_vs_absent_description_differ() {
    assert!(!values_equal(Some(&json!("")), None));

    let base = synced(Card::new("c1", "Original", ts(0)));
    let mut local = base.clone();
    local.position = 9.0;
    local.dirty_fields.insert(MutableField::Position);
    let remote = Card::new("c1", "Original", ts(0)).with_description("");

    let merged = merge_cards(&local, &remote);
    assert_eq!(merged.description.as_deref(), Some(""));
}

// ============================================================================
// Sequence Edge Cases
// ============================================================================

#[test]
fn large_label_lists() {
    let labels: Vec<String> = (0..1000).map(|i| format!("label-{i}")).collect();
    let base = synced(Card::new("c1", "Original", ts(0)).with_labels(labels.clone()));

    let mut remote_labels = labels.clone();
    remote_labels[999] = "changed".into();
    let remote = base.clone().with_labels(remote_labels.clone());

    let mut local = base.clone();
    local.title = "Edited".into();
    local.dirty_fields.insert(MutableField::Title);

    let merged = merge_cards(&local, &remote);
    assert_eq!(merged.labels, remote_labels);
    assert_eq!(merged.title, "Edited");
}

#[test]
fn duplicate_labels_are_significant() {
    assert!(!values_equal(Some(&json!(["a", "a"])), Some(&json!(["a"]))));
    assert!(values_equal(Some(&json!(["a", "a"])), Some(&json!(["a", "a"]))));
}

#[test]
fn assignees_cleared_remotely() {
    let base = synced(Card::new("c1", "Original", ts(0)).with_assignees(["ana", "bo"]));
    let mut local = base.clone();
    local.title = "Edited".into();
    local.dirty_fields.insert(MutableField::Title);
    let remote = Card::new("c1", "Original", ts(0));

    let merged = merge_cards(&local, &remote);
    assert!(merged.assignees.is_empty());
}

// ============================================================================
// Dirty Set Edge Cases
// ============================================================================

#[test]
fn every_field_dirty_and_changed() {
    let base = synced(Card::new("c1", "Original", ts(0)).with_description("d"));
    let mut local = base.clone().with_dirty_fields(FieldSet::all());
    local.title = "L".into();

    let remote = Card::new("c1", "R", ts(0))
        .with_status(lofi_sync::ColumnId::Done)
        .with_priority(lofi_sync::Priority::Low)
        .with_labels(["x"])
        .with_assignees(["y"])
        .with_position(7.0);

    let outcome = lofi_sync::Resolver::default().resolve(&local, &remote);
    assert_eq!(outcome.conflicts, FieldSet::all());
    assert!(outcome.adopted.is_empty());
    assert_eq!(outcome.card.title, "L");
    assert_eq!(outcome.card.description.as_deref(), Some("d"));
}

#[test]
fn empty_snapshot_treats_every_present_remote_value_as_changed() {
    let local = Card::new("c1", "Local", ts(0))
        .with_dirty_fields([MutableField::Title])
        .with_snapshot(SyncSnapshot::new());
    let remote = Card::new("c1", "Remote", ts(0)).with_priority(lofi_sync::Priority::High);

    let outcome = lofi_sync::Resolver::default().resolve(&local, &remote);
    assert!(outcome.is_conflict());
    assert_eq!(outcome.card.priority, lofi_sync::Priority::High);
    // description is absent on both sides
    assert!(!outcome.adopted.contains(MutableField::Description));
}

// ============================================================================
// Timestamp Edge Cases
// ============================================================================

#[test]
fn equal_timestamps_keep_local() {
    let base = synced(Card::new("c1", "Original", ts(100)));
    let mut local = base.clone();
    local.title = "Edited".into();
    local.dirty_fields.insert(MutableField::Title);

    let merged = merge_cards(&local, &base);
    assert_eq!(merged.updated_at, ts(100));
}

#[test]
fn fractional_second_timestamps_order() {
    let local_json = json!({
        "id": "c1", "title": "L", "status": "todo", "priority": "low",
        "labels": [], "assignees": [], "position": 0,
        "createdAt": "2023-01-01T00:00:00.000Z",
        "updatedAt": "2023-01-01T00:00:00.100Z",
        "dirtyFields": ["title"],
        "syncSnapshot": {"title": "L", "status": "todo", "priority": "low",
                         "labels": [], "assignees": [], "position": 0}
    });
    let mut remote_json = local_json.clone();
    remote_json["updatedAt"] = json!("2023-01-01T00:00:00.200Z");
    remote_json.as_object_mut().unwrap().remove("dirtyFields");

    let local = Card::from_value(local_json).unwrap();
    let remote = Card::from_value(remote_json).unwrap();

    let merged = merge_cards(&local, &remote);
    assert_eq!(merged.updated_at, remote.updated_at);
}

// ============================================================================
// Boundary Validation
// ============================================================================

#[test]
fn malformed_json_rejected() {
    assert!(matches!(
        Card::from_json("{not json"),
        Err(Error::InvalidPayload(_))
    ));
}

#[test]
fn snapshot_must_be_object() {
    let payload = json!({
        "id": "c1", "title": "T", "status": "todo", "priority": "low",
        "labels": [], "assignees": [], "position": 0,
        "createdAt": "2023-01-01T00:00:00Z", "updatedAt": "2023-01-01T00:00:00Z",
        "syncSnapshot": ["title"]
    });
    assert!(matches!(
        Card::from_value(payload),
        Err(Error::TypeMismatch { field, .. }) if field == "syncSnapshot"
    ));
}

// ============================================================================
// Store Lifecycle
// ============================================================================

#[test]
fn full_offline_round_trip() {
    let mut store = CardStore::new();
    let id = CardId::new("c1");

    // Initial pull
    store.apply_remote(synced(Card::new("c1", "Original", ts(0))));

    // Offline edit, concurrent remote change to another field
    store
        .edit(&id, MutableField::Title, json!("Offline edit"), ts(10))
        .unwrap();
    let remote = Card::new("c1", "Original", ts(0))
        .with_status(lofi_sync::ColumnId::InProgress)
        .with_updated_at(ts(5));

    let outcome = store.apply_remote(remote);
    assert!(!outcome.is_conflict());
    assert_eq!(outcome.pending, FieldSet::from([MutableField::Title]));

    // Driver pushes and acknowledges
    store.mark_synced(&id).unwrap();
    let card = store.get(&id).unwrap();
    assert_eq!(card.title, "Offline edit");
    assert_eq!(card.status, lofi_sync::ColumnId::InProgress);
    assert_eq!(card.sync_status, Some(SyncStatus::Synced));
    assert!(card.is_clean());

    // Next remote update passes straight through
    let next = Card::new("c1", "Renamed remotely", ts(0)).with_updated_at(ts(20));
    let outcome = store.apply_remote(next.clone());
    assert!(outcome.fast_path);
    assert_eq!(store.get(&id), Some(&next));
}
