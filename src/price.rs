//! Cost windowing and derivation over a node's metered price series.
//!
//! A node agent returns a price history as timestamped buckets; this
//! module orders the series, derives Total/Min/Average/Max statistics,
//! renders the window duration, and attributes a per-workload cost.
//! Statistics are always recomputed locally from the history so the
//! empty-series guarantees hold regardless of which collaborator
//! supplied the numbers.

use crate::elapsed::format_elapsed;
use crate::model::{nanos_to_millis, PricePoint, PriceWindow};

/// A timestamp-ordered price series.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    /// Build a series from raw buckets, sorting ascending by
    /// timestamp.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    /// Timestamp of the earliest bucket, if any. Used to record the
    /// effective window start when the caller omitted one.
    pub fn first_timestamp(&self) -> Option<i64> {
        self.0.first().map(|p| p.timestamp)
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().map(|p| p.price).sum()
    }

    /// Smallest bucket price; 0 for an empty series.
    pub fn min(&self) -> f64 {
        self.0.iter().map(|p| p.price).reduce(f64::min).unwrap_or(0.0)
    }

    /// Largest bucket price; 0 for an empty series.
    pub fn max(&self) -> f64 {
        self.0.iter().map(|p| p.price).reduce(f64::max).unwrap_or(0.0)
    }

    /// Arithmetic mean of bucket prices; 0 for an empty series, never
    /// NaN.
    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            0.0
        } else {
            self.sum() / self.0.len() as f64
        }
    }

    /// Collapse consecutive identical buckets.
    pub fn dedup(mut self) -> Self {
        self.0.dedup_by(|a, b| a.timestamp == b.timestamp && a.price == b.price);
        self
    }

    /// Buckets with `start <= timestamp < end`.
    pub fn window(&self, start: i64, end: i64) -> PriceSeries {
        PriceSeries(
            self.0
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp < end)
                .cloned()
                .collect(),
        )
    }

    /// Span between the first and last bucket, rendered with zero
    /// fractional digits. An empty series formats as `00h 00m 00s`.
    pub fn duration(&self) -> String {
        let nanos = match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        };
        format_elapsed(nanos_to_millis(nanos), 0)
    }

    /// Derive the windowed statistics, stamping each bucket with its
    /// human-readable time.
    pub fn into_window(self) -> PriceWindow {
        let total = self.sum();
        let min = self.min();
        let max = self.max();
        let average = self.mean();

        let mut history = self.0;
        for point in history.iter_mut() {
            point.time = bucket_time(point.timestamp);
        }

        PriceWindow {
            total,
            min,
            max,
            average,
            history,
        }
    }
}

/// Human-readable rendering of a bucket timestamp (UTC).
fn bucket_time(timestamp_nanos: i64) -> String {
    let millis = nanos_to_millis(timestamp_nanos) as i64;
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Cost incurred by a workload: the sum of all metered price buckets
/// observed after it began.
///
/// Scans ascending history for the first bucket past `workload_start`
/// and sums from there; a workload that started after all observed
/// history costs 0.
pub fn attribute_cost(history: &[PricePoint], workload_start: i64) -> f64 {
    match history.iter().position(|p| p.timestamp > workload_start) {
        Some(first) => history[first..].iter().map(|p| p.price).sum(),
        None => 0.0,
    }
}
