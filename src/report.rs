use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::evaluation::ResultRow;

const CSV_HEADER: [&str; 8] = [
    "id",
    "expected_valid",
    "expected_invalid",
    "solver_answer",
    "pass",
    "judge_reason",
    "judge_style_label",
    "judge_correct_math",
];

const REASON_WIDTH: usize = 60;

/// Receives progress while a batch runs and the ordered rows once it is done.
pub trait Reporter: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);

    fn on_batch_complete(&self, rows: &[ResultRow]) -> Result<()>;
}

/// Fans every callback out to several reporters, in order.
pub struct CompositeReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl CompositeReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for CompositeReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        for r in &self.reporters {
            r.on_progress(completed, total);
        }
    }

    fn on_batch_complete(&self, rows: &[ResultRow]) -> Result<()> {
        for r in &self.reporters {
            r.on_batch_complete(rows)?;
        }
        Ok(())
    }
}

/// Progress lines and the final summary table, through tracing.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        info!("Processing test cases... [{}/{}]", completed, total);
    }

    fn on_batch_complete(&self, rows: &[ResultRow]) -> Result<()> {
        for line in render_table(rows) {
            info!("{}", line);
        }
        Ok(())
    }
}

pub struct CsvReporter {
    path: PathBuf,
}

impl CsvReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for CsvReporter {
    fn on_progress(&self, _completed: usize, _total: usize) {}

    fn on_batch_complete(&self, rows: &[ResultRow]) -> Result<()> {
        let csv = render_csv(rows);
        std::fs::write(&self.path, &csv)
            .with_context(|| format!("Failed to write results to {}", self.path.display()))?;
        info!(
            rows = %rows.len(),
            digest = %results_digest(&csv),
            "Saved results to {}",
            self.path.display()
        );
        Ok(())
    }
}

pub fn render_csv(rows: &[ResultRow]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push_str("\r\n");

    for row in rows {
        let fields = [
            csv_field(&row.id),
            csv_field(&row.expected_valid),
            csv_field(&row.expected_invalid),
            csv_field(&row.solver_answer),
            py_bool(row.pass).to_string(),
            csv_field(&row.judge_reason),
            csv_field(row.judge_style_label.as_str()),
            py_bool(row.judge_correct_math).to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

/// SHA-256 of the rendered report, for comparing runs.
pub fn results_digest(csv: &str) -> String {
    hex::encode(Sha256::digest(csv.as_bytes()))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn render_table(rows: &[ResultRow]) -> Vec<String> {
    let id_width = rows.iter().map(|r| r.id.chars().count()).max().unwrap_or(0).max(2);
    let style_width = rows
        .iter()
        .map(|r| r.judge_style_label.as_str().len())
        .max()
        .unwrap_or(0)
        .max(5);

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push("Test Case Summary".to_string());
    lines.push(format!(
        "{:<id_width$} | {:<5} | {:<style_width$} | {:<12} | Reason",
        "ID", "PASS?", "Style", "Correct Math"
    ));
    lines.push("─".repeat(id_width + style_width + 30 + REASON_WIDTH));

    for r in rows {
        lines.push(format!(
            "{:<id_width$} | {:<5} | {:<style_width$} | {:<12} | {}",
            r.id,
            if r.pass { "YES" } else { "NO" },
            r.judge_style_label.as_str(),
            if r.judge_correct_math { "yes" } else { "no" },
            truncate_text(&r.judge_reason, REASON_WIDTH)
        ));
    }

    let passed = rows.iter().filter(|r| r.pass).count();
    lines.push(format!("Passed {}/{}", passed, rows.len()));
    lines
}

fn truncate_text(text: &str, max_len: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() > max_len {
        single_line.chars().take(max_len).collect::<String>() + "..."
    } else {
        single_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::test_case;
    use crate::evaluation::types::{JudgeVerdict, SolverOutcome, StyleLabel};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn passing_row(id: &str) -> ResultRow {
        ResultRow::new(
            &test_case(id),
            &SolverOutcome::Answer("x = 2".to_string()),
            JudgeVerdict {
                pass: true,
                reason: "Correct.".to_string(),
                style_label: StyleLabel::StepByStep,
                correct_math: true,
            },
        )
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = render_csv(&[passing_row("a")]);
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next().unwrap(),
            "id,expected_valid,expected_invalid,solver_answer,pass,judge_reason,judge_style_label,judge_correct_math"
        );
        assert_eq!(
            lines.next().unwrap(),
            "a,Step-by-Step,Incomplete,x = 2,True,Correct.,Step-by-Step,True"
        );
    }

    #[test]
    fn test_csv_quotes_special_characters() {
        let mut row = passing_row("b");
        row.solver_answer = "Step 1: x, y\nAnswer: \"4\"".to_string();
        let csv = render_csv(&[row]);
        assert!(csv.contains("\"Step 1: x, y\nAnswer: \"\"4\"\"\""));
    }

    #[test]
    fn test_csv_fallback_row() {
        let row = ResultRow::new(
            &test_case("c"),
            &SolverOutcome::Error("boom".to_string()),
            JudgeVerdict::solver_failed(),
        );
        let csv = render_csv(&[row]);
        assert!(csv.contains("c,Step-by-Step,Incomplete,[ERROR] boom,False,Solver call failed.,Incomplete,False"));
    }

    #[test]
    fn test_digest_is_stable() {
        let rows = vec![passing_row("a"), passing_row("b")];
        let d1 = results_digest(&render_csv(&rows));
        let d2 = results_digest(&render_csv(&rows));
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
        assert_ne!(d1, results_digest(&render_csv(&rows[..1])));
    }

    #[test]
    fn test_csv_reporter_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let reporter = CsvReporter::new(tmp.path().join("results.csv"));
        reporter.on_batch_complete(&[passing_row("a")]).unwrap();

        let written = std::fs::read_to_string(reporter.path()).unwrap();
        assert_eq!(written, render_csv(&[passing_row("a")]));
    }

    #[test]
    fn test_csv_reporter_unwritable_path() {
        let tmp = tempfile::tempdir().unwrap();
        let reporter = CsvReporter::new(tmp.path().join("missing-dir").join("results.csv"));
        assert!(reporter.on_batch_complete(&[]).is_err());
    }

    #[test]
    fn test_table_lines() {
        let mut failing = passing_row("b");
        failing.pass = false;
        failing.judge_reason = "r".repeat(100);
        let lines = render_table(&[passing_row("a"), failing]);

        assert_eq!(lines[0], "Test Case Summary");
        assert!(lines[1].starts_with("ID"));
        assert!(lines[3].contains("YES"));
        assert!(lines[4].contains("NO"));
        assert!(lines[4].ends_with("..."));
        assert_eq!(lines.last().unwrap(), "Passed 1/2");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("line\nbreak", 20), "line break");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
    }

    struct Recording(Arc<Mutex<Vec<String>>>, &'static str);

    impl Reporter for Recording {
        fn on_progress(&self, completed: usize, total: usize) {
            self.0.lock().push(format!("{}:{}/{}", self.1, completed, total));
        }

        fn on_batch_complete(&self, rows: &[ResultRow]) -> Result<()> {
            self.0.lock().push(format!("{}:done:{}", self.1, rows.len()));
            Ok(())
        }
    }

    #[test]
    fn test_composite_forwards_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeReporter::new(vec![
            Box::new(Recording(log.clone(), "first")),
            Box::new(Recording(log.clone(), "second")),
        ]);
        composite.on_progress(1, 2);
        composite.on_batch_complete(&[passing_row("a")]).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:1/2", "second:1/2", "first:done:1", "second:done:1"]
        );
    }
}
