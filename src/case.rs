use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::CaseSourceError;

/// One problem instance. Loaded once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub problem: String,
    #[serde(rename = "image_path")]
    pub problem_artifact: PathBuf,
    #[serde(rename = "image_problem_answer_path")]
    pub expected_artifact: PathBuf,
    #[serde(rename = "expected_valid")]
    pub expected_valid_label: String,
    #[serde(rename = "expected_invalid")]
    pub expected_invalid_label: String,
}

/// Read a JSONL descriptor file, one case per non-blank line.
pub fn load_cases(path: &Path) -> Result<Vec<Case>, CaseSourceError> {
    info!("Loading test cases from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| CaseSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cases = parse_cases(&content)?;
    info!("Loaded {} test cases", cases.len());
    Ok(cases)
}

pub fn parse_cases(content: &str) -> Result<Vec<Case>, CaseSourceError> {
    let mut cases = Vec::new();
    let mut seen = HashSet::new();

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let case: Case = serde_json::from_str(line)
            .map_err(|source| CaseSourceError::Malformed { line: i + 1, source })?;

        if !seen.insert(case.id.clone()) {
            return Err(CaseSourceError::DuplicateId {
                id: case.id,
                line: i + 1,
            });
        }

        debug!(case_id = %case.id, "Parsed case");
        cases.push(case);
    }

    Ok(cases)
}

#[cfg(test)]
pub(crate) fn test_case(id: &str) -> Case {
    Case {
        id: id.to_string(),
        problem: format!("Find the vertex of parabola {}", id),
        problem_artifact: PathBuf::from(format!("images/{}.png", id)),
        expected_artifact: PathBuf::from(format!("images/{}_answer.png", id)),
        expected_valid_label: "Step-by-Step".to_string(),
        expected_invalid_label: "Incomplete".to_string(),
    }
}
