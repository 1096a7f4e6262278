use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotatorError, Result};

/// Name of the implicit identifier column. It never appears in
/// [`RecordStore::columns`].
pub const ID_COLUMN: &str = "id";

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// String shown in tables and compared by filters. Booleans render as
    /// `Yes`/`No` and absent values as the empty string.
    pub fn display(&self) -> String {
        self.to_string()
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Bool(true) => f.write_str("Yes"),
            FieldValue::Bool(false) => f.write_str("No"),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub values: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    /// Display string of `column`; missing columns render like
    /// [`FieldValue::Empty`].
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(FieldValue::display).unwrap_or_default()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FieldValue::as_f64)
    }

    pub fn flag(&self, column: &str) -> bool {
        self.get(column)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    fn column_set(&self) -> BTreeSet<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

/// Ordered collection of records sharing one column set.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        let expected: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        for record in &records {
            let found = record.column_set();
            if found != expected {
                return Err(AnnotatorError::SchemaMismatch {
                    record: record.id.clone(),
                    expected: expected.iter().map(|value| value.to_string()).collect(),
                    found: found.iter().map(|value| value.to_string()).collect(),
                });
            }
        }

        Ok(Self { columns, records })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }
}
