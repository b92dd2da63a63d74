//! Elapsed-time rendering: `HHh MMm SSs`, with a day prefix past 24
//! hours, plus a live-updating variant for still-running workloads.
//!
//! The live path is the only recurring timer in the crate: a spawned
//! tokio task ticking once per second, publishing the re-rendered
//! string through a watch channel. The task carries an explicit
//! cancellation handle and ends either on drop (view teardown) or when
//! the tracked interval's stop timestamp is reported non-zero.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::nanos_to_millis;

/// Period of the live-update tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Format a millisecond duration as `HHh MMm SSs`, splitting hours
/// into a `{days}d ` prefix beyond 24 hours.
///
/// Hours, minutes and the integer part of seconds are zero-padded to
/// two digits; `precision` controls fractional second digits.
pub fn format_elapsed(elapsed_ms: f64, precision: usize) -> String {
    let total_secs = if elapsed_ms > 0.0 { elapsed_ms / 1000.0 } else { 0.0 };

    let mut hours = (total_secs / 3600.0).floor() as i64;
    let minutes = ((total_secs - hours as f64 * 3600.0) / 60.0).floor() as i64;
    let seconds = total_secs - hours as f64 * 3600.0 - minutes as f64 * 60.0;

    let mut out = String::new();
    if hours >= 24 {
        out.push_str(&format!("{}d ", hours / 24));
        hours %= 24;
    }

    let mut secs = format!("{seconds:.precision$}");
    // Pad on the rendered digits, not the raw value: 9.9996 renders
    // as "10.000" at three digits and needs no pad.
    let int_digits = secs.find('.').unwrap_or(secs.len());
    if int_digits < 2 {
        secs.insert(0, '0');
    }
    out.push_str(&format!("{hours:02}h {minutes:02}m {secs}s"));
    out
}

/// Format the span between two epoch-nano timestamps.
///
/// A non-zero `stop` yields a static rendering; `stop == 0` means the
/// span is open-ended: the current elapsed time is rendered and the
/// returned flag tells the caller it must live-update (see
/// [`ElapsedTicker`]).
pub fn format_span(start_nanos: i64, stop_nanos: i64, precision: usize) -> (String, bool) {
    if stop_nanos != 0 {
        let elapsed_ms = nanos_to_millis(stop_nanos - start_nanos);
        (format_elapsed(elapsed_ms, precision), false)
    } else {
        let elapsed_ms = now_millis() - nanos_to_millis(start_nanos);
        (format_elapsed(elapsed_ms, precision), true)
    }
}

fn now_millis() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

/// Live-updating elapsed-time renderer for an open-ended span.
///
/// Owns its timer task exclusively; dropping the ticker aborts the
/// task, and reporting a non-zero stop via [`set_stop`] renders the
/// final static value and releases the timer.
///
/// [`set_stop`]: ElapsedTicker::set_stop
pub struct ElapsedTicker {
    rendered: watch::Receiver<String>,
    stop_tx: watch::Sender<i64>,
    task: JoinHandle<()>,
}

impl ElapsedTicker {
    /// Spawn a ticker for a span starting at `start_nanos`, updating
    /// every [`TICK_PERIOD`].
    pub fn spawn(start_nanos: i64, precision: usize) -> Self {
        Self::spawn_with_period(start_nanos, precision, TICK_PERIOD)
    }

    fn spawn_with_period(start_nanos: i64, precision: usize, period: Duration) -> Self {
        let (initial, _) = format_span(start_nanos, 0, precision);
        let (rendered_tx, rendered) = watch::channel(initial);
        let (stop_tx, mut stop_rx) = watch::channel(0i64);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // immediate first tick, already rendered
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let (rendered, _) = format_span(start_nanos, 0, precision);
                        let _ = rendered_tx.send(rendered);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let stop = *stop_rx.borrow();
                        if stop != 0 {
                            let (rendered, _) = format_span(start_nanos, stop, precision);
                            let _ = rendered_tx.send(rendered);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            rendered,
            stop_tx,
            task,
        }
    }

    /// Watch the rendered string for changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rendered.clone()
    }

    /// Most recently rendered value.
    pub fn current(&self) -> String {
        self.rendered.borrow().clone()
    }

    /// Report that the tracked span has stopped. A non-zero timestamp
    /// renders the final value and ends the timer task.
    pub fn set_stop(&self, stop_nanos: i64) {
        let _ = self.stop_tx.send(stop_nanos);
    }

    /// True once the timer task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
