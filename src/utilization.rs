//! Per-workload utilization percentages and aggregate used/free
//! capacity for one node.
//!
//! Percentages are computed independently per workload against node
//! capacity and are deliberately unclamped: summed allocations may
//! exceed capacity (overcommit), and downstream presentation relies on
//! seeing values above 100. Aggregate `free` is signed for the same
//! reason.

use crate::model::{Node, NodeUtilization, UtilizationPair, Workload};

/// Render an allocation as a rounded integer percentage of capacity.
///
/// A zero allocation is treated as 100% of nothing and displays as
/// `100`; a zero-capacity node fixes every percentage at `100` rather
/// than dividing by zero.
fn percent_of(allocation: i64, capacity: u64) -> String {
    if allocation > 0 && capacity > 0 {
        let pct = (allocation as f64 / capacity as f64) * 100.0;
        format!("{}", pct.round() as i64)
    } else {
        "100".to_string()
    }
}

/// Attach `CPUPercent`/`MemoryPercent` to each workload and compute
/// the node's aggregate used/free capacity.
///
/// `used` sums raw allocation values (not percentages); `free` is
/// `capacity - used` and may go negative. Signaling overcommit
/// visually is the caller's concern.
pub fn annotate(node: &Node, workloads: &mut [Workload]) -> NodeUtilization {
    let mut used_cpu: i64 = 0;
    let mut used_memory: i64 = 0;

    for workload in workloads.iter_mut() {
        workload.cpu_percent = percent_of(workload.cpu_shares, node.cpu_shares);
        workload.memory_percent = percent_of(workload.memory, node.memory);
        used_cpu += workload.cpu_shares;
        used_memory += workload.memory;
    }

    NodeUtilization {
        cpu: UtilizationPair {
            used: used_cpu,
            free: node.cpu_shares as i64 - used_cpu,
        },
        memory: UtilizationPair {
            used: used_memory,
            free: node.memory as i64 - used_memory,
        },
    }
}
