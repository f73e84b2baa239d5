use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::stages::{Judge, Solver};
use super::types::{JudgeVerdict, ResultRow, SolverOutcome};
use super::verdict::parse_verdict;
use crate::case::Case;

/// Which path a case took through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed,
    SolverFailed,
    JudgeFailed,
    JudgeMalformed,
    StyleMismatch,
    /// The case task panicked before producing a row.
    Aborted,
}

#[derive(Debug, Clone)]
pub struct CaseResult {
    pub row: ResultRow,
    pub outcome: CaseOutcome,
    pub execution_time_ms: u64,
}

/// Runs Solve then Judge for one case and always yields a row.
pub struct CasePipeline {
    solver: Arc<dyn Solver>,
    judge: Arc<dyn Judge>,
    enforce_style_consistency: bool,
}

impl CasePipeline {
    pub fn new(solver: Arc<dyn Solver>, judge: Arc<dyn Judge>) -> Self {
        Self {
            solver,
            judge,
            enforce_style_consistency: false,
        }
    }

    pub fn with_style_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_style_consistency = enforce;
        self
    }

    pub async fn run(&self, case: &Case) -> CaseResult {
        let start = Instant::now();
        debug!(case_id = %case.id, "Starting case");

        let solver_outcome = match self.solver.solve(case).await {
            Ok(answer) => {
                debug!(
                    case_id = %case.id,
                    solve_ms = %start.elapsed().as_millis(),
                    "Solver answered"
                );
                SolverOutcome::Answer(answer)
            }
            Err(e) => {
                error!(case_id = %case.id, error = %e, "Solver error");
                SolverOutcome::Error(e.to_string())
            }
        };

        let (verdict, outcome) = match &solver_outcome {
            SolverOutcome::Error(_) => (JudgeVerdict::solver_failed(), CaseOutcome::SolverFailed),
            SolverOutcome::Answer(answer) => self.grade(case, answer).await,
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;
        let row = ResultRow::new(case, &solver_outcome, verdict);

        info!(
            case_id = %case.id,
            pass = %row.pass,
            style = %row.judge_style_label,
            correct_math = %row.judge_correct_math,
            execution_time_ms = %execution_time_ms,
            "{} {}",
            case.id,
            if row.pass { "PASS" } else { "FAIL" }
        );

        CaseResult {
            row,
            outcome,
            execution_time_ms,
        }
    }

    async fn grade(&self, case: &Case, answer: &str) -> (JudgeVerdict, CaseOutcome) {
        let raw = match self.judge.judge(case, answer).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(case_id = %case.id, error = %e, "Judge error");
                return (JudgeVerdict::judge_failed(&e), CaseOutcome::JudgeFailed);
            }
        };

        let verdict = match parse_verdict(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(case_id = %case.id, error = %e, "Judge returned an unusable verdict");
                return (JudgeVerdict::invalid_json(), CaseOutcome::JudgeMalformed);
            }
        };

        if !verdict.is_consistent() {
            warn!(
                case_id = %case.id,
                pass = %verdict.pass,
                style = %verdict.style_label,
                "Style label does not match pass/fail"
            );
            if self.enforce_style_consistency {
                return (JudgeVerdict::style_mismatch(&verdict), CaseOutcome::StyleMismatch);
            }
        }

        let outcome = if verdict.pass {
            CaseOutcome::Passed
        } else {
            CaseOutcome::Failed
        };
        (verdict, outcome)
    }
}
