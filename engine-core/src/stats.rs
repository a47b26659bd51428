//! The stats collector (§4.1): a process-wide table of per-label counters,
//! safe under concurrent updates from the reader, writer, and index tasks.
//! Grounded on the teacher's atomic `Metrics` (`engine-core/src/metrics.rs`)
//! but keyed by free-form label rather than one fixed struct, and extended
//! with a scoped timer and a final render, per the spec's `Stats` contract.

use model::progress::ProgressSink;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
struct LabelCounters {
    read: AtomicU64,
    /// Rows accepted by PostgreSQL. Signed: a batch split can transiently
    /// decrement this below what has been reported so far (§3 invariants).
    rows: AtomicI64,
    errs: AtomicU64,
    secs: AtomicU64, // microseconds, to keep this lock-free like the rest
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub read: u64,
    pub rows: i64,
    pub errs: u64,
    pub secs: f64,
}

/// Shared, cloneable handle onto the run's statistics table (§3 `Stats`).
#[derive(Debug, Clone, Default)]
pub struct Stats {
    labels: Arc<Mutex<HashMap<String, Arc<LabelCounters>>>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self, label: &str) -> Arc<LabelCounters> {
        let mut guard = self.labels.lock().expect("stats mutex poisoned");
        guard
            .entry(label.to_string())
            .or_insert_with(|| Arc::new(LabelCounters::default()))
            .clone()
    }

    pub fn incr_read(&self, label: &str, delta: u64) {
        self.label(label).read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn incr_errs(&self, label: &str, delta: u64) {
        self.label(label).errs.fetch_add(delta, Ordering::Relaxed);
    }

    /// `rows` has no negative-delta floor; a batch-split rollback is
    /// expressed as a negative `delta`.
    pub fn incr_rows(&self, label: &str, delta: i64) {
        self.label(label).rows.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn add_timing(&self, label: &str, secs: f64) {
        let micros = (secs * 1_000_000.0) as u64;
        self.label(label).secs.fetch_add(micros, Ordering::Relaxed);
    }

    /// Overwrites `rows` for `label` to exactly `n` — used once per batch
    /// commit, where the writer already knows the authoritative accepted
    /// count rather than an incremental delta (§4.1 `set_rows_from_result`).
    pub fn set_rows_from_result(&self, label: &str, n: i64) {
        self.label(label).rows.store(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, label: &str) -> Counters {
        let counters = self.label(label);
        Counters {
            read: counters.read.load(Ordering::Relaxed),
            rows: counters.rows.load(Ordering::Relaxed),
            errs: counters.errs.load(Ordering::Relaxed),
            secs: counters.secs.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }

    /// A scoped timer: records elapsed wall-clock into `label`'s `secs`
    /// field when the returned guard is dropped, including on an early
    /// return or unwind from the caller's scope (§4.1 `scoped_timer`).
    pub fn scoped_timer(&self, label: impl Into<String>) -> ScopedTimer {
        ScopedTimer {
            stats: self.clone(),
            label: label.into(),
            start: Instant::now(),
        }
    }

    /// Per-label `{read, rows, errs, secs}` plus a grand total, formatted
    /// for the final report (§7 User-visible behavior).
    pub fn render(&self) -> String {
        let guard = self.labels.lock().expect("stats mutex poisoned");
        let mut out = String::new();
        let mut total = Counters::default();

        let mut labels: Vec<&String> = guard.keys().collect();
        labels.sort();

        for label in labels {
            let counters = &guard[label];
            let snap = Counters {
                read: counters.read.load(Ordering::Relaxed),
                rows: counters.rows.load(Ordering::Relaxed),
                errs: counters.errs.load(Ordering::Relaxed),
                secs: counters.secs.load(Ordering::Relaxed) as f64 / 1_000_000.0,
            };
            out.push_str(&format!(
                "{label}: read={} rows={} errs={} secs={:.3}\n",
                snap.read, snap.rows, snap.errs, snap.secs
            ));
            total.read += snap.read;
            total.rows += snap.rows;
            total.errs += snap.errs;
            total.secs += snap.secs;
        }

        out.push_str(&format!(
            "TOTAL: read={} rows={} errs={} secs={:.3}\n",
            total.read, total.rows, total.errs, total.secs
        ));
        out
    }
}

pub struct ScopedTimer {
    stats: Stats,
    label: String,
    start: Instant,
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.stats
            .add_timing(&self.label, self.start.elapsed().as_secs_f64());
    }
}

/// A fixed-label view of `Stats` implementing the narrow `ProgressSink`
/// interface `connectors` readers/writers are handed, so they never need to
/// depend on `engine-core` directly.
pub struct StatsLabelHandle {
    stats: Stats,
    label: String,
}

impl StatsLabelHandle {
    pub fn new(stats: Stats, label: impl Into<String>) -> Self {
        Self {
            stats,
            label: label.into(),
        }
    }
}

impl ProgressSink for StatsLabelHandle {
    fn inc_read(&self, n: u64) {
        self.stats.incr_read(&self.label, n);
    }

    fn inc_rows(&self, n: u64) {
        self.stats.incr_rows(&self.label, n as i64);
    }

    fn inc_errs(&self, n: u64) {
        self.stats.incr_errs(&self.label, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_commutative_and_associative() {
        let stats = Stats::new();
        stats.incr_read("t", 3);
        stats.incr_rows("t", 2);
        stats.incr_rows("t", -1);
        stats.incr_errs("t", 1);
        let snap = stats.snapshot("t");
        assert_eq!(snap.read, 3);
        assert_eq!(snap.rows, 1);
        assert_eq!(snap.errs, 1);
    }

    #[test]
    fn scoped_timer_records_on_drop() {
        let stats = Stats::new();
        {
            let _timer = stats.scoped_timer("load");
        }
        assert!(stats.snapshot("load").secs >= 0.0);
    }

    #[test]
    fn render_includes_grand_total() {
        let stats = Stats::new();
        stats.incr_read("a", 5);
        stats.incr_rows("a", 5);
        stats.incr_read("b", 2);
        stats.incr_rows("b", 1);
        let rendered = stats.render();
        assert!(rendered.contains("TOTAL: read=7 rows=6"));
    }
}
