use serde::{Deserialize, Serialize};
use std::fmt;

use crate::case::Case;

pub const SOLVER_FAILED_REASON: &str = "Solver call failed.";
pub const JUDGE_FAILED_PREFIX: &str = "Judge call failed: ";
pub const JUDGE_INVALID_JSON_REASON: &str = "Judge returned invalid JSON.";
pub const STYLE_MISMATCH_PREFIX: &str = "Judge verdict inconsistent with style label: ";
pub const INTERNAL_FAILURE_PREFIX: &str = "Case pipeline aborted: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleLabel {
    #[serde(rename = "Step-by-Step")]
    StepByStep,
    #[serde(rename = "Complete")]
    Complete,
    #[serde(rename = "Accurate")]
    Accurate,
    #[serde(rename = "Incomplete")]
    Incomplete,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Clarification Needed")]
    ClarificationNeeded,
}

impl StyleLabel {
    pub const ALL: [StyleLabel; 6] = [
        StyleLabel::StepByStep,
        StyleLabel::Complete,
        StyleLabel::Accurate,
        StyleLabel::Incomplete,
        StyleLabel::WrongAnswer,
        StyleLabel::ClarificationNeeded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleLabel::StepByStep => "Step-by-Step",
            StyleLabel::Complete => "Complete",
            StyleLabel::Accurate => "Accurate",
            StyleLabel::Incomplete => "Incomplete",
            StyleLabel::WrongAnswer => "Wrong Answer",
            StyleLabel::ClarificationNeeded => "Clarification Needed",
        }
    }

    /// Labels a passing verdict is allowed to carry.
    pub fn is_passing(&self) -> bool {
        matches!(
            self,
            StyleLabel::StepByStep | StyleLabel::Complete | StyleLabel::Accurate
        )
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub pass: bool,
    pub reason: String,
    pub style_label: StyleLabel,
    pub correct_math: bool,
}

impl JudgeVerdict {
    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            reason: reason.into(),
            style_label: StyleLabel::Incomplete,
            correct_math: false,
        }
    }

    pub fn solver_failed() -> Self {
        Self::fallback(SOLVER_FAILED_REASON)
    }

    pub fn judge_failed(diagnostic: impl fmt::Display) -> Self {
        Self::fallback(format!("{}{}", JUDGE_FAILED_PREFIX, diagnostic))
    }

    pub fn invalid_json() -> Self {
        Self::fallback(JUDGE_INVALID_JSON_REASON)
    }

    pub fn style_mismatch(verdict: &JudgeVerdict) -> Self {
        Self::fallback(format!(
            "{}pass={} style_label={}",
            STYLE_MISMATCH_PREFIX, verdict.pass, verdict.style_label
        ))
    }

    pub fn internal_failure(diagnostic: impl fmt::Display) -> Self {
        Self::fallback(format!("{}{}", INTERNAL_FAILURE_PREFIX, diagnostic))
    }

    /// Whether `style_label` belongs to the set allowed for `pass`.
    pub fn is_consistent(&self) -> bool {
        self.pass == self.style_label.is_passing()
    }
}

/// Result of the Solve stage for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    Answer(String),
    Error(String),
}

impl SolverOutcome {
    /// Text stored in the row's answer column.
    pub fn answer_text(&self) -> String {
        match self {
            SolverOutcome::Answer(text) => text.clone(),
            SolverOutcome::Error(msg) => format!("[ERROR] {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    pub expected_valid: String,
    pub expected_invalid: String,
    pub solver_answer: String,
    pub pass: bool,
    pub judge_reason: String,
    pub judge_style_label: StyleLabel,
    pub judge_correct_math: bool,
}

impl ResultRow {
    pub fn new(case: &Case, solver: &SolverOutcome, verdict: JudgeVerdict) -> Self {
        Self {
            id: case.id.clone(),
            expected_valid: case.expected_valid_label.clone(),
            expected_invalid: case.expected_invalid_label.clone(),
            solver_answer: solver.answer_text(),
            pass: verdict.pass,
            judge_reason: verdict.reason,
            judge_style_label: verdict.style_label,
            judge_correct_math: verdict.correct_math,
        }
    }
}
