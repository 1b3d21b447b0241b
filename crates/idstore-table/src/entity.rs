use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TableError;

/// Seconds between 1601-01-01T00:00:00Z and the Unix epoch.
const MIN_TIMESTAMP_SECS: i64 = -11_644_473_600;

/// Earliest instant the store can represent. Earlier values are rejected on write.
pub fn min_datetime() -> DateTime<Utc> {
    DateTime::from_timestamp(MIN_TIMESTAMP_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Raise `value` to [`min_datetime`] if it lies before it.
pub fn clamp_datetime(value: DateTime<Utc>) -> DateTime<Utc> {
    value.max(min_datetime())
}

/// A typed property value. The store is schema-less; each row carries its own set.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::DateTime(_) => "datetime",
            Self::Guid(_) => "guid",
        }
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

/// One row: its two-part key plus a bag of named properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_owned(), value.into());
        self
    }

    /// Set the property only when `value` is `Some`; absent properties read back as `None`.
    pub fn with_opt<V: Into<PropertyValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn get_str(&self, name: &str) -> Result<&str, TableError> {
        self.get_opt_str(name)?
            .ok_or_else(|| TableError::MalformedEntity(format!("missing property {name}")))
    }

    pub fn get_opt_str(&self, name: &str) -> Result<Option<&str>, TableError> {
        match self.get(name) {
            None => Ok(None),
            Some(PropertyValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(type_mismatch(name, "string", other)),
        }
    }

    /// Absent booleans read as `false`.
    pub fn get_bool(&self, name: &str) -> Result<bool, TableError> {
        match self.get(name) {
            None => Ok(false),
            Some(PropertyValue::Bool(b)) => Ok(*b),
            Some(other) => Err(type_mismatch(name, "bool", other)),
        }
    }

    /// Absent integers read as `0`.
    pub fn get_int(&self, name: &str) -> Result<i64, TableError> {
        match self.get(name) {
            None => Ok(0),
            Some(PropertyValue::Int(i)) => Ok(*i),
            Some(other) => Err(type_mismatch(name, "int", other)),
        }
    }

    pub fn get_opt_datetime(&self, name: &str) -> Result<Option<DateTime<Utc>>, TableError> {
        match self.get(name) {
            None => Ok(None),
            Some(PropertyValue::DateTime(dt)) => Ok(Some(*dt)),
            Some(other) => Err(type_mismatch(name, "datetime", other)),
        }
    }

    pub fn get_guid(&self, name: &str) -> Result<Uuid, TableError> {
        match self.get(name) {
            Some(PropertyValue::Guid(g)) => Ok(*g),
            None => Err(TableError::MalformedEntity(format!(
                "missing property {name}"
            ))),
            Some(other) => Err(type_mismatch(name, "guid", other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, found: &PropertyValue) -> TableError {
    TableError::MalformedEntity(format!(
        "property {name}: expected {expected}, found {}",
        found.type_name()
    ))
}
