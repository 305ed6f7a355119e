//! Mutable card fields and the fixed-size set used to track them.
//!
//! Dirty tracking works over a closed enumeration of field names, so every
//! pass over the mergeable fields is exhaustive and checked at compile time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A card field that takes part in field-level merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutableField {
    Title,
    Description,
    Status,
    Priority,
    Labels,
    Assignees,
    Position,
}

impl MutableField {
    /// Every mutable field, in canonical order.
    pub const ALL: [MutableField; 7] = [
        MutableField::Title,
        MutableField::Description,
        MutableField::Status,
        MutableField::Priority,
        MutableField::Labels,
        MutableField::Assignees,
        MutableField::Position,
    ];

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutableField::Title => "title",
            MutableField::Description => "description",
            MutableField::Status => "status",
            MutableField::Priority => "priority",
            MutableField::Labels => "labels",
            MutableField::Assignees => "assignees",
            MutableField::Position => "position",
        }
    }

    /// Look up a field by wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for MutableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`MutableField`]s backed by a bitmask.
///
/// Serialized as a JSON array of field names in canonical order. On
/// deserialization, `null` reads as the empty set and unrecognised names are
/// dropped.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(u8);

impl FieldSet {
    /// The empty set.
    pub const fn new() -> Self {
        Self(0)
    }

    /// The set of every mutable field.
    pub fn all() -> Self {
        MutableField::ALL.into_iter().collect()
    }

    /// Add a field. Returns true if it was not already present.
    pub fn insert(&mut self, field: MutableField) -> bool {
        let had = self.contains(field);
        self.0 |= field.bit();
        !had
    }

    /// Remove a field. Returns true if it was present.
    pub fn remove(&mut self, field: MutableField) -> bool {
        let had = self.contains(field);
        self.0 &= !field.bit();
        had
    }

    /// Check membership.
    pub fn contains(&self, field: MutableField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Fields present in either set.
    pub fn union(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 | other.0)
    }

    /// Iterate members in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = MutableField> + '_ {
        MutableField::ALL
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

impl FromIterator<MutableField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = MutableField>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl<const N: usize> From<[MutableField; N]> for FieldSet {
    fn from(fields: [MutableField; N]) -> Self {
        fields.into_iter().collect()
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        let mut set = FieldSet::new();
        for name in names {
            match MutableField::from_name(&name) {
                Some(field) => {
                    set.insert(field);
                }
                None => tracing::warn!(field = %name, "dropping unknown dirty field"),
            }
        }
        Ok(set)
    }
}
