//! Schema definition and validation for cards arriving at the boundary.
//!
//! The merge engine assumes well-formed input. This module is the layer that
//! makes the assumption hold: payloads from storage or the network are checked
//! here before they are turned into [`Card`](crate::Card)s.

use crate::{error::Result, ColumnId, Error, Priority, SyncStatus};
use serde_json::Value;
use std::fmt;

/// Field types supported in the card schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    /// Array of strings
    StringList,
    /// String drawn from a fixed set of names
    Enum(&'static [&'static str]),
    /// RFC 3339 date-time string
    Timestamp,
    /// Array of field names; unknown names are tolerated here and dropped later
    FieldNames,
    /// Arbitrary JSON object
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Number => write!(f, "Number"),
            FieldType::StringList => write!(f, "StringList"),
            FieldType::Enum(_) => write!(f, "Enum"),
            FieldType::Timestamp => write!(f, "Timestamp"),
            FieldType::FieldNames => write!(f, "FieldNames"),
            FieldType::Object => write!(f, "Object"),
        }
    }
}

/// Definition of a field in the card schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Wire name (camelCase)
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// Reject empty strings
    pub non_empty: bool,
}

impl FieldDef {
    /// Create a new required field definition.
    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            non_empty: false,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            non_empty: false,
        }
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    /// Validate a JSON value against this field definition.
    pub fn validate(&self, value: Option<&Value>) -> Result<()> {
        match value {
            None | Some(Value::Null) if self.required => {
                Err(Error::MissingRequiredField(self.name.to_string()))
            }
            None | Some(Value::Null) => Ok(()),
            Some(v) => self.validate_value(v),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<()> {
        let valid = match self.field_type {
            FieldType::String | FieldType::Enum(_) | FieldType::Timestamp => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::StringList | FieldType::FieldNames => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldType::Object => value.is_object(),
        };

        if !valid {
            return Err(Error::TypeMismatch {
                field: self.name.to_string(),
                expected: self.field_type.to_string(),
                got: json_type_name(value).to_string(),
            });
        }

        match (self.field_type, value) {
            (FieldType::String, Value::String(s)) if self.non_empty && s.is_empty() => {
                Err(self.invalid("must not be empty".into()))
            }
            (FieldType::Enum(names), Value::String(s)) if !names.contains(&s.as_str()) => Err(
                self.invalid(format!("'{}' is not one of {}", s, names.join(", "))),
            ),
            (FieldType::Timestamp, Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|e| self.invalid(format!("not an RFC 3339 timestamp: {e}"))),
            _ => Ok(()),
        }
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidValue {
            field: self.name.to_string(),
            reason,
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Schema for card payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSchema {
    pub fields: Vec<FieldDef>,
}

impl CardSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// The card shape exchanged between client, server and store.
    pub fn standard() -> Self {
        Self::new(vec![
            FieldDef::required("id", FieldType::String).non_empty(),
            FieldDef::required("title", FieldType::String).non_empty(),
            FieldDef::optional("description", FieldType::String),
            FieldDef::required("status", FieldType::Enum(ColumnId::NAMES)),
            FieldDef::required("priority", FieldType::Enum(Priority::NAMES)),
            FieldDef::required("labels", FieldType::StringList),
            FieldDef::required("assignees", FieldType::StringList),
            FieldDef::required("position", FieldType::Number),
            FieldDef::required("createdAt", FieldType::Timestamp),
            FieldDef::required("updatedAt", FieldType::Timestamp),
            FieldDef::optional("dirtyFields", FieldType::FieldNames),
            FieldDef::optional("syncSnapshot", FieldType::Object),
            FieldDef::optional("syncStatus", FieldType::Enum(SyncStatus::NAMES)),
        ])
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a payload against this schema.
    pub fn validate(&self, payload: &Value) -> Result<()> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("card must be an object".into()))?;

        for field in &self.fields {
            field.validate(obj.get(field.name))?;
        }

        Ok(())
    }
}
