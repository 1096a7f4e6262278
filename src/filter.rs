use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnnotatorError, Result};
use crate::record::Record;

/// One `(column, value)` equality clause. Either side left empty makes the
/// clause match every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterClause {
    pub column: String,
    pub value: String,
}

impl FilterClause {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_vacuous(&self) -> bool {
        self.column.is_empty() || self.value.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.is_vacuous() {
            return true;
        }
        record.display(&self.column) == self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClauseField {
    Column,
    Value,
}

/// Ordered clause list edited by the filter panel.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    clauses: Vec<FilterClause>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn add_clause(&mut self) {
        self.clauses.push(FilterClause::default());
        debug!(clauses = self.clauses.len(), "added filter clause");
    }

    pub fn remove_clause(&mut self, index: usize) -> Result<FilterClause> {
        self.check_index(index)?;
        let removed = self.clauses.remove(index);
        debug!(index, clauses = self.clauses.len(), "removed filter clause");
        Ok(removed)
    }

    /// Sets one side of the clause at `index`. Changing the column clears the
    /// value, since value choices are specific to a column.
    pub fn update_clause(&mut self, index: usize, field: ClauseField, new_value: &str) -> Result<()> {
        self.check_index(index)?;
        let clause = &mut self.clauses[index];
        match field {
            ClauseField::Column => {
                clause.column = new_value.to_string();
                clause.value.clear();
            }
            ClauseField::Value => clause.value = new_value.to_string(),
        }
        debug!(index, ?field, value = new_value, "updated filter clause");
        Ok(())
    }

    pub fn reset_clauses(&mut self) {
        self.clauses.clear();
        debug!("reset filter clauses");
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        apply(records, &self.clauses)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.clauses.len() {
            return Err(AnnotatorError::IndexOutOfRange {
                index,
                len: self.clauses.len(),
            });
        }
        Ok(())
    }
}

/// Records matching every clause, in their original order.
pub fn apply<'a>(records: &'a [Record], clauses: &[FilterClause]) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| clauses.iter().all(|clause| clause.matches(record)))
        .collect()
}
