//! Metrics aggregation and cost dashboard backend for metered
//! container fleets.
//!
//! This crate turns raw node/workload/price data into everything a
//! fleet dashboard displays: utilization percentages against node
//! capacity, dynamic label columns, stably sorted table rows,
//! elapsed-time strings, and windowed cost statistics.
//!
//! ## Architecture
//!
//! The aggregation engine is pure and synchronous:
//!
//! 1. **Utilization** (`utilization`) - per-workload percent of node
//!    capacity plus aggregate used/free (signed, overcommit-aware).
//! 2. **Label discovery** (`labels`) - sorted union of workload label
//!    keys for dynamic table columns.
//! 3. **Cost windowing** (`price`) - Total/Min/Average/Max over a
//!    price series and per-workload cost attribution.
//! 4. **Elapsed time** (`elapsed`) - `HHh MMm SSs` rendering and the
//!    crate's single live-update timer.
//! 5. **Sorting** (`sort`) - stable ordering by built-in fields or
//!    discovered label keys.
//!
//! Around it, `client` fetches node/workload/price data over HTTP and
//! `server` exposes the composed view to the dashboard UI.

pub mod client;
pub mod elapsed;
pub mod labels;
pub mod model;
pub mod price;
pub mod server;
pub mod sort;
pub mod utilization;
