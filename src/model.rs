//! Core view-model types shared between the engine, the fetch
//! collaborator, and the viewer API.
//!
//! Wire field names follow the node agent's JSON (Go-style exported
//! names: `ID`, `CPUShares`, `Timestamp`, ...); serde renames map them
//! to idiomatic Rust fields. All timestamps are nanoseconds since the
//! Unix epoch.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Nanoseconds per millisecond, for display-time conversions.
pub const NANOS_PER_MILLI: f64 = 1e6;

/// Convert an epoch-nanosecond timestamp to fractional milliseconds.
pub fn nanos_to_millis(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_MILLI
}

/// OS and hardware info reported by a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Platform {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Family", default)]
    pub family: String,
    #[serde(rename = "Version")]
    pub version: String,
}

/// A compute host with fixed CPU-share and memory capacity.
///
/// Read-only from the engine's perspective: capacity fields are
/// invariant for the lifetime of a fetched view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "Name")]
    pub name: String,
    /// Accessible address of the node agent.
    #[serde(rename = "Address")]
    pub address: String,
    /// Total CPU capacity in abstract shares.
    #[serde(rename = "CPUShares")]
    pub cpu_shares: u64,
    /// Total memory capacity in bytes.
    #[serde(rename = "Memory")]
    pub memory: u64,
    /// Time the system booted, epoch nanos.
    #[serde(rename = "BootTime", default)]
    pub boot_time: u64,
    #[serde(rename = "Platform", default)]
    pub platform: Platform,
    /// Arbitrary node metadata (instance type, zone, ...) used for
    /// grouping and display chips.
    #[serde(rename = "Meta", default)]
    pub meta: HashMap<String, String>,
}

/// A scheduled unit consuming a slice of a node's capacity.
///
/// Lifecycle timestamps are epoch nanos; a `stop` or `destroy` of 0
/// means the workload is still running / still allocated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workload {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Create")]
    pub create: i64,
    #[serde(rename = "Start")]
    pub start: i64,
    #[serde(rename = "Stop")]
    pub stop: i64,
    #[serde(rename = "Destroy")]
    pub destroy: i64,
    /// Allocated memory in bytes.
    #[serde(rename = "Memory")]
    pub memory: i64,
    /// Allocated CPU shares.
    #[serde(rename = "CPUShares")]
    pub cpu_shares: i64,
    #[serde(rename = "Labels", default)]
    pub labels: HashMap<String, String>,

    // Derived fields attached per view by the engine. Rounded integer
    // percentages rendered as strings; may exceed "100" under
    // overcommit.
    #[serde(rename = "CPUPercent", default, skip_serializing_if = "String::is_empty")]
    pub cpu_percent: String,
    #[serde(rename = "MemoryPercent", default, skip_serializing_if = "String::is_empty")]
    pub memory_percent: String,
    /// Attributed cost: sum of all price buckets observed after the
    /// workload started.
    #[serde(rename = "Price", default)]
    pub price: f64,
}

impl Workload {
    /// True if the workload's resources have been released.
    pub fn destroyed(&self) -> bool {
        self.destroy > 0
    }

    /// Duration the workload was actually running (`stop - start`,
    /// clamped to zero).
    pub fn run_time(&self) -> Duration {
        delta(self.stop, self.start)
    }

    /// Duration the workload's resources were allocated
    /// (`destroy - create`, clamped to zero).
    pub fn allocated_time(&self) -> Duration {
        delta(self.destroy, self.create)
    }
}

fn delta(end: i64, start: i64) -> Duration {
    let d = end - start;
    if d > 0 {
        Duration::from_nanos(d as u64)
    } else {
        Duration::ZERO
    }
}

/// One timestamped cost sample in a node's metered price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Epoch nanos.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
    /// Price for this bucket. The historical wire name is `Value`.
    #[serde(rename = "Price", alias = "Value")]
    pub price: f64,
    /// Human-readable bucket time, derived for display.
    #[serde(rename = "Time", default, skip_serializing_if = "String::is_empty")]
    pub time: String,
}

/// Windowed cost statistics over a price history.
///
/// `history` is ascending by timestamp; `total` equals the sum of its
/// prices (within floating-point epsilon). All statistics are exactly
/// zero for an empty history, never NaN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceWindow {
    #[serde(rename = "Total")]
    pub total: f64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Average")]
    pub average: f64,
    #[serde(rename = "History", default)]
    pub history: Vec<PricePoint>,
}

/// Used/free capacity for one resource. `free = capacity - used` and
/// may be negative, signaling overcommit to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UtilizationPair {
    #[serde(rename = "Used")]
    pub used: i64,
    #[serde(rename = "Free")]
    pub free: i64,
}

impl UtilizationPair {
    /// True when summed allocations exceed capacity.
    pub fn overcommitted(&self) -> bool {
        self.free < 0
    }
}

/// Aggregate utilization of one node across its workloads.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NodeUtilization {
    #[serde(rename = "CPU")]
    pub cpu: UtilizationPair,
    #[serde(rename = "Memory")]
    pub memory: UtilizationPair,
}

/// Fleet-wide capacity totals for the nodes overview.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FleetSummary {
    #[serde(rename = "Nodes")]
    pub nodes: usize,
    #[serde(rename = "CPUShares")]
    pub cpu_shares: u64,
    #[serde(rename = "Memory")]
    pub memory: u64,
}

/// Sum node capacities for the fleet overview header.
pub fn summarize_fleet(nodes: &[Node]) -> FleetSummary {
    FleetSummary {
        nodes: nodes.len(),
        cpu_shares: nodes.iter().map(|n| n.cpu_shares).sum(),
        memory: nodes.iter().map(|n| n.memory).sum(),
    }
}
