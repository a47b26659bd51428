//! Final run report (§7 User-visible behavior): per-label
//! `{read, rows, errs, secs}` counters plus grand totals, grouped under the
//! run's four phases.

use engine_core::stats::Stats;

pub const PHASE_BEFORE_LOAD: &str = "Before Load";
pub const PHASE_LOAD: &str = "Load";
pub const PHASE_INDEXES: &str = "Indexes";
pub const PHASE_AFTER_LOAD: &str = "After Load";

/// Renders `stats` as the final migration report. `Stats::render` already
/// produces a sorted per-label listing with a grand total; this just frames
/// it with the run's phase names for the operator-facing summary.
pub fn render(stats: &Stats) -> String {
    let mut out = String::new();
    out.push_str("=== Migration Report ===\n");
    out.push_str(&stats.render());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_wraps_stats_output() {
        let stats = Stats::new();
        stats.incr_read(PHASE_LOAD, 10);
        stats.incr_rows(PHASE_LOAD, 9);
        stats.incr_errs(PHASE_LOAD, 1);
        let report = render(&stats);
        assert!(report.contains("=== Migration Report ==="));
        assert!(report.contains("Load: read=10 rows=9 errs=1"));
    }
}
