//! Dynamic table-column discovery from workload labels.
//!
//! Workloads carry an open-ended label mapping; the table renders one
//! column per distinct key. The key set is unioned across all
//! workloads, minus the reserved `name` key (it backs the built-in
//! Name column), and sorted for a deterministic column order.

use crate::model::Workload;
use std::collections::BTreeSet;

/// Label key excluded from discovered columns.
pub const RESERVED_LABEL: &str = "name";

/// Collect the sorted, de-duplicated set of label keys present across
/// all workloads, excluding [`RESERVED_LABEL`].
///
/// Deterministic with respect to workload order; an empty workload
/// list yields an empty column set.
pub fn discover_labels(workloads: &[Workload]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for workload in workloads {
        for key in workload.labels.keys() {
            if key != RESERVED_LABEL {
                keys.insert(key.clone());
            }
        }
    }
    keys.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_workload(labels: &[(&str, &str)]) -> Workload {
        Workload {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_workloads() {
        assert!(discover_labels(&[]).is_empty());
    }

    #[test]
    fn test_union_sorted_deduped() {
        let workloads = vec![
            make_workload(&[("team", "infra"), ("env", "prod")]),
            make_workload(&[("env", "prod"), ("app", "web")]),
        ];
        assert_eq!(discover_labels(&workloads), vec!["app", "env", "team"]);
    }

    #[test]
    fn test_reserved_name_excluded() {
        let workloads = vec![
            make_workload(&[("name", "a"), ("env", "prod")]),
            make_workload(&[("name", "b")]),
        ];
        assert_eq!(discover_labels(&workloads), vec!["env"]);
    }

    #[test]
    fn test_reserved_match_is_exact() {
        let workloads = vec![make_workload(&[("Name", "a"), ("names", "b")])];
        assert_eq!(discover_labels(&workloads), vec!["Name", "names"]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let a = vec![
            make_workload(&[("zone", "1")]),
            make_workload(&[("app", "web")]),
        ];
        let b = vec![
            make_workload(&[("app", "web")]),
            make_workload(&[("zone", "1")]),
        ];
        assert_eq!(discover_labels(&a), discover_labels(&b));
    }
}
