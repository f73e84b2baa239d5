use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::evaluation::CaseOutcome;

#[derive(Debug)]
pub struct Metrics {
    pub cases_total: AtomicU64,
    pub cases_passed: AtomicU64,
    pub cases_failed: AtomicU64,
    pub solver_failures: AtomicU64,
    pub judge_failures: AtomicU64,
    pub judge_malformed: AtomicU64,
    pub style_mismatches: AtomicU64,
    pub cases_aborted: AtomicU64,
    pub duration_sum_ms: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cases_total: AtomicU64::new(0),
            cases_passed: AtomicU64::new(0),
            cases_failed: AtomicU64::new(0),
            solver_failures: AtomicU64::new(0),
            judge_failures: AtomicU64::new(0),
            judge_malformed: AtomicU64::new(0),
            style_mismatches: AtomicU64::new(0),
            cases_aborted: AtomicU64::new(0),
            duration_sum_ms: AtomicU64::new(0),
        })
    }

    pub fn record_case(&self, outcome: CaseOutcome, duration_ms: u64) {
        self.cases_total.fetch_add(1, Ordering::Relaxed);
        self.duration_sum_ms.fetch_add(duration_ms, Ordering::Relaxed);

        let counter = match outcome {
            CaseOutcome::Passed => &self.cases_passed,
            CaseOutcome::Failed => &self.cases_failed,
            CaseOutcome::SolverFailed => &self.solver_failures,
            CaseOutcome::JudgeFailed => &self.judge_failures,
            CaseOutcome::JudgeMalformed => &self.judge_malformed,
            CaseOutcome::StyleMismatch => &self.style_mismatches,
            CaseOutcome::Aborted => &self.cases_aborted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_summary(&self) -> String {
        let total = self.cases_total.load(Ordering::Relaxed);
        let passed = self.cases_passed.load(Ordering::Relaxed);
        let failed = self.cases_failed.load(Ordering::Relaxed);
        let solver = self.solver_failures.load(Ordering::Relaxed);
        let judge = self.judge_failures.load(Ordering::Relaxed);
        let malformed = self.judge_malformed.load(Ordering::Relaxed);
        let mismatched = self.style_mismatches.load(Ordering::Relaxed);
        let aborted = self.cases_aborted.load(Ordering::Relaxed);
        let dur_sum = self.duration_sum_ms.load(Ordering::Relaxed);

        let pass_rate = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let avg_ms = if total > 0 { dur_sum / total } else { 0 };

        format!(
            "cases={} passed={} failed={} solver_failures={} judge_failures={} \
             judge_malformed={} style_mismatches={} aborted={} pass_rate={:.1}% avg_case_ms={}",
            total, passed, failed, solver, judge, malformed, mismatched, aborted, pass_rate, avg_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_outcomes() {
        let m = Metrics::new();
        m.record_case(CaseOutcome::Passed, 100);
        m.record_case(CaseOutcome::SolverFailed, 50);
        m.record_case(CaseOutcome::JudgeMalformed, 30);

        assert_eq!(m.cases_total.load(Ordering::Relaxed), 3);
        assert_eq!(m.cases_passed.load(Ordering::Relaxed), 1);
        assert_eq!(m.solver_failures.load(Ordering::Relaxed), 1);
        assert_eq!(m.judge_malformed.load(Ordering::Relaxed), 1);
        assert_eq!(m.duration_sum_ms.load(Ordering::Relaxed), 180);
    }

    #[test]
    fn test_summary_output() {
        let m = Metrics::new();
        m.record_case(CaseOutcome::Passed, 1000);
        m.record_case(CaseOutcome::Failed, 3000);
        let out = m.render_summary();
        assert!(out.contains("cases=2"));
        assert!(out.contains("passed=1"));
        assert!(out.contains("pass_rate=50.0%"));
        assert!(out.contains("avg_case_ms=2000"));
    }

    #[test]
    fn test_summary_empty_batch() {
        let m = Metrics::new();
        assert!(m.render_summary().contains("pass_rate=0.0%"));
    }

    #[test]
    fn test_aborted_cases_counted() {
        let m = Metrics::new();
        m.record_case(CaseOutcome::Aborted, 0);
        m.record_case(CaseOutcome::Passed, 10);
        assert_eq!(m.cases_total.load(Ordering::Relaxed), 2);
        assert_eq!(m.cases_aborted.load(Ordering::Relaxed), 1);
        assert!(m.render_summary().contains("aborted=1"));
    }
}
