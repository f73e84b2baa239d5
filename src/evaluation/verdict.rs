use serde_json::Value;

use super::types::{JudgeVerdict, StyleLabel};
use crate::error::VerdictError;

/// Parse the judge's raw payload into a verdict.
///
/// The payload must be a JSON object carrying a known `style_label`. Missing
/// `pass` and `correct_math` read as `false`, a missing `reason` as empty.
pub fn parse_verdict(raw: &str) -> Result<JudgeVerdict, VerdictError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let obj = value.as_object().ok_or(VerdictError::NotAnObject)?;

    let label = obj.get("style_label").and_then(Value::as_str);
    let style_label = label
        .and_then(StyleLabel::parse)
        .ok_or_else(|| VerdictError::UnknownStyleLabel(label.map(str::to_string)))?;

    Ok(JudgeVerdict {
        pass: obj.get("pass").and_then(Value::as_bool).unwrap_or(false),
        reason: obj
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        style_label,
        correct_math: obj
            .get("correct_math")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}
