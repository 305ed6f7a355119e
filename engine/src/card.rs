//! Card types: the record subject to field-level merge.

use crate::{
    error::Result, schema::CardSchema, Error, FieldSet, MutableField, Timestamp,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque card identifier.
///
/// The merge engine only compares it for equality; it is never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Wrap a raw identifier without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Board column a card sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnId {
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl ColumnId {
    pub const NAMES: &'static [&'static str] = &["backlog", "todo", "in_progress", "review", "done"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Backlog => "backlog",
            ColumnId::Todo => "todo",
            ColumnId::InProgress => "in_progress",
            ColumnId::Review => "review",
            ColumnId::Done => "done",
        }
    }
}

/// Card priority, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const NAMES: &'static [&'static str] = &["low", "medium", "high", "critical"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Synchronization state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// In agreement with the remote copy
    Synced,
    /// Local edits waiting to be pushed
    Dirty,
    /// A field changed on both sides since the last sync
    Conflict,
    /// Created locally, never synced
    Local,
}

impl SyncStatus {
    pub const NAMES: &'static [&'static str] = &["synced", "dirty", "conflict", "local"];
}

/// Field values as of the last successful sync.
///
/// This is the common ancestor for three-way comparison. Keys are always
/// mutable fields; a `null` value is stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSnapshot(BTreeMap<MutableField, Value>);

impl SyncSnapshot {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Snapshot every mutable field of a card.
    pub fn capture(card: &Card) -> Self {
        let mut snapshot = Self::new();
        for field in MutableField::ALL {
            if let Some(value) = card.field_value(field) {
                snapshot.insert(field, value);
            }
        }
        snapshot
    }

    /// Snapshot value of a field, `None` if it was absent.
    pub fn get(&self, field: MutableField) -> Option<&Value> {
        self.0.get(&field)
    }

    /// Record a value. `null` removes the entry.
    pub fn insert(&mut self, field: MutableField, value: Value) {
        if value.is_null() {
            self.0.remove(&field);
        } else {
            self.0.insert(field, value);
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: MutableField, value: Value) -> Self {
        self.insert(field, value);
        self
    }

    /// Forget a field, returning its previous value.
    pub fn remove(&mut self, field: MutableField) -> Option<Value> {
        self.0.remove(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields with a recorded value, in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = MutableField> + '_ {
        self.0.keys().copied()
    }
}

impl<'de> Deserialize<'de> for SyncSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut snapshot = SyncSnapshot::new();
        for (name, value) in raw {
            match MutableField::from_name(&name) {
                Some(field) => snapshot.insert(field, value),
                None => tracing::warn!(field = %name, "dropping unknown snapshot field"),
            }
        }
        Ok(snapshot)
    }
}

/// A Kanban card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier, never merged
    pub id: CardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ColumnId,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    /// Sort order within the column
    pub position: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Fields edited locally since the last successful sync
    #[serde(default, skip_serializing_if = "FieldSet::is_empty")]
    pub dirty_fields: FieldSet,
    /// Field values at the last successful sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_snapshot: Option<SyncSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
}

impl Card {
    /// Create a card in the `todo` column with medium priority.
    pub fn new(id: impl Into<CardId>, title: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: ColumnId::Todo,
            priority: Priority::Medium,
            labels: Vec::new(),
            assignees: Vec::new(),
            position: 0.0,
            created_at: timestamp,
            updated_at: timestamp,
            dirty_fields: FieldSet::new(),
            sync_snapshot: None,
            sync_status: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: ColumnId) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sort position. Must be finite to serialize.
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    pub fn with_updated_at(mut self, timestamp: Timestamp) -> Self {
        self.updated_at = timestamp;
        self
    }

    pub fn with_dirty_fields(mut self, fields: impl Into<FieldSet>) -> Self {
        self.dirty_fields = fields.into();
        self
    }

    pub fn with_snapshot(mut self, snapshot: SyncSnapshot) -> Self {
        self.sync_snapshot = Some(snapshot);
        self
    }

    pub fn with_sync_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = Some(status);
        self
    }

    /// True when no local edits are pending.
    pub fn is_clean(&self) -> bool {
        self.dirty_fields.is_empty()
    }

    pub fn is_conflict(&self) -> bool {
        self.sync_status == Some(SyncStatus::Conflict)
    }

    /// Project a mutable field to a dynamic value. `None` means absent.
    pub fn field_value(&self, field: MutableField) -> Option<Value> {
        match field {
            MutableField::Title => Some(Value::String(self.title.clone())),
            MutableField::Description => self.description.clone().map(Value::String),
            MutableField::Status => Some(Value::String(self.status.as_str().to_string())),
            MutableField::Priority => Some(Value::String(self.priority.as_str().to_string())),
            MutableField::Labels => Some(string_list(&self.labels)),
            MutableField::Assignees => Some(string_list(&self.assignees)),
            MutableField::Position => serde_json::Number::from_f64(self.position).map(Value::Number),
        }
    }

    /// Copy one mutable field from another card.
    pub fn adopt_field(&mut self, other: &Card, field: MutableField) {
        match field {
            MutableField::Title => self.title = other.title.clone(),
            MutableField::Description => self.description = other.description.clone(),
            MutableField::Status => self.status = other.status,
            MutableField::Priority => self.priority = other.priority,
            MutableField::Labels => self.labels = other.labels.clone(),
            MutableField::Assignees => self.assignees = other.assignees.clone(),
            MutableField::Position => self.position = other.position,
        }
    }

    /// Set a mutable field from a dynamic value.
    ///
    /// The card is left untouched if the value has the wrong shape.
    pub fn set_field(&mut self, field: MutableField, value: Value) -> Result<()> {
        match field {
            MutableField::Title => {
                let title = expect_string(field, value)?;
                if title.is_empty() {
                    return Err(Error::InvalidValue {
                        field: field.to_string(),
                        reason: "must not be empty".into(),
                    });
                }
                self.title = title;
            }
            MutableField::Description => {
                self.description = match value {
                    Value::Null => None,
                    other => Some(expect_string(field, other)?),
                };
            }
            MutableField::Status => self.status = parse_enum(field, value)?,
            MutableField::Priority => self.priority = parse_enum(field, value)?,
            MutableField::Labels => self.labels = expect_string_list(field, value)?,
            MutableField::Assignees => self.assignees = expect_string_list(field, value)?,
            MutableField::Position => {
                self.position = value.as_f64().ok_or_else(|| Error::TypeMismatch {
                    field: field.to_string(),
                    expected: "Number".into(),
                    got: crate::schema::json_type_name(&value).into(),
                })?;
            }
        }
        Ok(())
    }

    /// Validate a JSON value against the card schema and deserialize it.
    pub fn from_value(value: Value) -> Result<Self> {
        CardSchema::standard().validate(&value)?;
        serde_json::from_value(value).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Parse, validate and deserialize a card from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidPayload(e.to_string()))?;
        Self::from_value(value)
    }

    /// Serialize to JSON text.
    ///
    /// Fails on a non-finite `position`, which JSON cannot represent.
    pub fn to_json(&self) -> Result<String> {
        if !self.position.is_finite() {
            return Err(Error::InvalidValue {
                field: MutableField::Position.to_string(),
                reason: format!("{} is not a finite number", self.position),
            });
        }
        serde_json::to_string(self).map_err(|e| Error::InvalidPayload(e.to_string()))
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn expect_string(field: MutableField, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::TypeMismatch {
            field: field.to_string(),
            expected: "String".into(),
            got: crate::schema::json_type_name(&other).into(),
        }),
    }
}

fn expect_string_list(field: MutableField, value: Value) -> Result<Vec<String>> {
    let mismatch = |value: &Value| Error::TypeMismatch {
        field: field.to_string(),
        expected: "StringList".into(),
        got: crate::schema::json_type_name(value).into(),
    };
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(mismatch(&other)),
            })
            .collect(),
        other => Err(mismatch(&other)),
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(field: MutableField, value: Value) -> Result<T> {
    let shown = value.to_string();
    serde_json::from_value(value).map_err(|_| Error::InvalidValue {
        field: field.to_string(),
        reason: format!("unknown variant {shown}"),
    })
}
