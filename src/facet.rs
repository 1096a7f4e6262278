use std::collections::BTreeSet;

use serde::Serialize;

use crate::record::{Record, RecordStore};

/// Distinct display values of `column`, ascending. Feeds the value picker of a
/// filter clause.
pub fn unique_values<'a, I>(records: I, column: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    if column.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .map(|record| record.display(column))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub key: String,
    pub label: String,
}

pub fn headers(store: &RecordStore) -> Vec<ColumnHeader> {
    store
        .columns()
        .iter()
        .map(|key| ColumnHeader {
            key: key.clone(),
            label: column_label(key),
        })
        .collect()
}

pub fn column_label(key: &str) -> String {
    key.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::new("1").with("city", "New York").with("has_pet", true),
            Record::new("2").with("city", "Chicago").with("has_pet", false),
            Record::new("3").with("city", "New York").with("has_pet", true),
            Record::new("4").with("city", "Austin").with("has_pet", false),
        ]
    }

    #[test]
    fn values_are_sorted_and_distinct() {
        let records = records();
        assert_eq!(
            unique_values(&records, "city"),
            vec!["Austin", "Chicago", "New York"]
        );
    }

    #[test]
    fn booleans_render_before_sorting() {
        let records = records();
        assert_eq!(unique_values(&records, "has_pet"), vec!["No", "Yes"]);
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        let records = records();
        assert!(unique_values(&records, "").is_empty());
        assert!(unique_values(&Vec::<Record>::new(), "city").is_empty());
    }

    #[test]
    fn absent_values_collapse_to_the_empty_string() {
        let records = vec![
            Record::new("1").with("stage", "Seed"),
            Record::new("2"),
            Record::new("3").with("stage", crate::record::FieldValue::Empty),
        ];
        assert_eq!(unique_values(&records, "stage"), vec!["", "Seed"]);
    }

    #[test]
    fn labels_replace_underscores() {
        assert_eq!(column_label("has_pet"), "has pet");
        assert_eq!(column_label("brand_name"), "brand name");
    }
}
