//! Stable table ordering over built-in fields and dynamically
//! discovered label columns.
//!
//! Rows expose typed sort values through [`SortKeyed`]; numeric fields
//! compare numerically, string and label fields lexicographically.
//! Values of mixed type (or rows missing the key entirely) compare
//! equal, so ordering degrades gracefully while `output length ==
//! input length` always holds. Sorting is stable: ties preserve the
//! original input order.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::model::Workload;

/// Sort direction for a table column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Active sort column and direction, with the table's toggle
/// semantics: re-selecting the active column flips direction,
/// selecting a new column resets to descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Apply a column selection.
    pub fn toggle(&mut self, key: &str) {
        if self.key == key && self.direction == SortDirection::Desc {
            self.direction = SortDirection::Asc;
        } else {
            self.key = key.to_string();
            self.direction = SortDirection::Desc;
        }
    }
}

/// A typed value extracted from a row for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

/// Rows that can be ordered by a named key.
pub trait SortKeyed {
    /// Value of the given built-in field or label key, if the row
    /// carries one.
    fn sort_value(&self, key: &str) -> Option<SortValue>;
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        // Mixed types are not ordered against each other.
        _ => Ordering::Equal,
    }
}

/// Descending comparator: rows with larger values first.
fn desc_compare<R: SortKeyed>(a: &R, b: &R, key: &str) -> Ordering {
    match (a.sort_value(key), b.sort_value(key)) {
        (Some(av), Some(bv)) => compare_values(&bv, &av),
        _ => Ordering::Equal,
    }
}

/// Stably sort rows in place by `key` in the given direction.
pub fn sort_rows<R: SortKeyed>(rows: &mut [R], key: &str, direction: SortDirection) {
    match direction {
        SortDirection::Desc => rows.sort_by(|a, b| desc_compare(a, b, key)),
        SortDirection::Asc => rows.sort_by(|a, b| desc_compare(a, b, key).reverse()),
    }
}

impl SortKeyed for Workload {
    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "ID" => Some(SortValue::Text(self.id.clone())),
            "Name" => Some(SortValue::Text(self.name.clone())),
            "CPUShares" => Some(SortValue::Number(self.cpu_shares as f64)),
            "Memory" => Some(SortValue::Number(self.memory as f64)),
            "Create" => Some(SortValue::Number(self.create as f64)),
            "Start" => Some(SortValue::Number(self.start as f64)),
            "Stop" => Some(SortValue::Number(self.stop as f64)),
            "Destroy" => Some(SortValue::Number(self.destroy as f64)),
            "Price" => Some(SortValue::Number(self.price)),
            // Derived percentages are display strings and compare as
            // such, matching the table's cell contents.
            "CPUPercent" => Some(SortValue::Text(self.cpu_percent.clone())),
            "MemoryPercent" => Some(SortValue::Text(self.memory_percent.clone())),
            _ => self.labels.get(key).map(|v| SortValue::Text(v.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_workload(id: &str, cpu_shares: i64, labels: &[(&str, &str)]) -> Workload {
        Workload {
            id: id.to_string(),
            cpu_shares,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn ids(rows: &[Workload]) -> Vec<&str> {
        rows.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_desc_numeric() {
        let mut rows = vec![
            make_workload("a", 100, &[]),
            make_workload("b", 300, &[]),
            make_workload("c", 200, &[]),
        ];
        sort_rows(&mut rows, "CPUShares", SortDirection::Desc);
        assert_eq!(ids(&rows), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_asc_numeric() {
        let mut rows = vec![
            make_workload("a", 100, &[]),
            make_workload("b", 300, &[]),
            make_workload("c", 200, &[]),
        ];
        sort_rows(&mut rows, "CPUShares", SortDirection::Asc);
        assert_eq!(ids(&rows), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_label_key_lexicographic() {
        let mut rows = vec![
            make_workload("a", 0, &[("env", "prod")]),
            make_workload("b", 0, &[("env", "dev")]),
            make_workload("c", 0, &[("env", "staging")]),
        ];
        sort_rows(&mut rows, "env", SortDirection::Asc);
        assert_eq!(ids(&rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_preserve_input_order() {
        let mut rows = vec![
            make_workload("first", 100, &[]),
            make_workload("second", 100, &[]),
            make_workload("third", 100, &[]),
        ];
        sort_rows(&mut rows, "CPUShares", SortDirection::Desc);
        assert_eq!(ids(&rows), vec!["first", "second", "third"]);
        sort_rows(&mut rows, "CPUShares", SortDirection::Asc);
        assert_eq!(ids(&rows), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_key_leaves_order_untouched() {
        let mut rows = vec![
            make_workload("a", 1, &[("env", "prod")]),
            make_workload("b", 2, &[]),
            make_workload("c", 3, &[("env", "dev")]),
        ];
        // "b" has no "env" label; rows missing the key compare equal
        // to everything, so no reordering crosses them.
        sort_rows(&mut rows, "zone", SortDirection::Desc);
        assert_eq!(ids(&rows), vec!["a", "b", "c"]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_toggle_flips_active_column() {
        let mut spec = SortSpec::new("Price");
        assert_eq!(spec.direction, SortDirection::Desc);
        spec.toggle("Price");
        assert_eq!(spec.direction, SortDirection::Asc);
        spec.toggle("Price");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn test_toggle_new_column_resets_to_desc() {
        let mut spec = SortSpec::new("Price");
        spec.toggle("Price");
        assert_eq!(spec.direction, SortDirection::Asc);
        spec.toggle("Memory");
        assert_eq!(spec.key, "Memory");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    proptest! {
        #[test]
        fn prop_sort_preserves_length(shares in prop::collection::vec(any::<i64>(), 0..64)) {
            let mut rows: Vec<Workload> = shares
                .iter()
                .enumerate()
                .map(|(i, &s)| make_workload(&format!("w{i}"), s, &[]))
                .collect();
            let before = rows.len();
            sort_rows(&mut rows, "CPUShares", SortDirection::Desc);
            prop_assert_eq!(rows.len(), before);
        }

        #[test]
        fn prop_desc_is_non_increasing(shares in prop::collection::vec(any::<i32>(), 0..64)) {
            let mut rows: Vec<Workload> = shares
                .iter()
                .enumerate()
                .map(|(i, &s)| make_workload(&format!("w{i}"), s as i64, &[]))
                .collect();
            sort_rows(&mut rows, "CPUShares", SortDirection::Desc);
            for pair in rows.windows(2) {
                prop_assert!(pair[0].cpu_shares >= pair[1].cpu_shares);
            }
        }

        #[test]
        fn prop_asc_reversed_equals_desc_for_distinct_keys(
            shares in prop::collection::hash_set(any::<i32>(), 0..64)
        ) {
            let rows: Vec<Workload> = shares
                .iter()
                .enumerate()
                .map(|(i, &s)| make_workload(&format!("w{i}"), s as i64, &[]))
                .collect();

            let mut asc = rows.clone();
            sort_rows(&mut asc, "CPUShares", SortDirection::Asc);
            asc.reverse();

            let mut desc = rows;
            sort_rows(&mut desc, "CPUShares", SortDirection::Desc);

            prop_assert_eq!(ids(&asc), ids(&desc));
        }
    }
}
