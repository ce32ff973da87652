//! Response validation: turns untrusted model text into a validated `AnalysisResult`.
//!
//! No field is read before its presence and type have been checked. Every
//! failure names the offending field.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::analysis::models::{
    AnalysisResult, SalaryEstimation, Score, ValidatedAnalysis, ValidationWarning,
};
use crate::analysis::prompts::{EXPECTED_SKILL_GAPS, EXPECTED_SUGGESTIONS, MIN_MISSING_KEYWORDS};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response is not valid JSON: {source}")]
    InvalidJson {
        raw: String,
        source: serde_json::Error,
    },

    #[error("response is not a JSON object")]
    NotAnObject { raw: String },

    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

impl SchemaError {
    /// The raw model output, when the failure happened before any field was read.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            SchemaError::InvalidJson { raw, .. } | SchemaError::NotAnObject { raw } => Some(raw),
            _ => None,
        }
    }

    /// The field that failed validation, if the failure is field-specific.
    pub fn field(&self) -> Option<&str> {
        match self {
            SchemaError::MissingField { field } | SchemaError::WrongType { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`, `JSON`) on the opening fence line.
    let body = match stripped.find('\n') {
        Some(idx) if stripped[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &stripped[idx + 1..]
        }
        _ => stripped,
    };
    let body = body.trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

/// Parses and validates raw model output.
pub fn parse_analysis(raw: &str) -> Result<ValidatedAnalysis, SchemaError> {
    let text = strip_json_fences(raw);
    let value: Value = serde_json::from_str(text).map_err(|source| SchemaError::InvalidJson {
        raw: raw.to_string(),
        source,
    })?;
    let obj = value.as_object().ok_or_else(|| SchemaError::NotAnObject {
        raw: raw.to_string(),
    })?;

    let mut warnings = Vec::new();

    let raw_score = require_string(obj, "score", "")?;
    let score = parse_score(&raw_score, &mut warnings);

    let missing_keywords = require_string_list(obj, "missing_keywords")?;
    let existing_keywords = require_string_list(obj, "existing_keywords")?;
    let skill_gaps = require_string_list(obj, "skill_gaps")?;
    let summary = require_string(obj, "summary", "")?;
    let suggestions = require_string_list(obj, "suggestions")?;
    let salary_estimation = require_salary(obj)?;

    expect_at_least("missing_keywords", &missing_keywords, MIN_MISSING_KEYWORDS, &mut warnings);
    expect_at_least("skill_gaps", &skill_gaps, EXPECTED_SKILL_GAPS, &mut warnings);
    expect_at_least("suggestions", &suggestions, EXPECTED_SUGGESTIONS, &mut warnings);

    Ok(ValidatedAnalysis {
        result: AnalysisResult {
            score,
            missing_keywords,
            existing_keywords,
            skill_gaps,
            summary,
            suggestions,
            salary_estimation,
        },
        warnings,
    })
}

/// Reads `"X/100"` into a score. Out-of-range values clamp, unreadable ones become 0.
pub fn parse_score(raw: &str, warnings: &mut Vec<ValidationWarning>) -> Score {
    let numerator = raw
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('%')
        .trim();

    let parsed = numerator.parse::<i64>().ok().or_else(|| {
        numerator
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.round() as i64)
    });

    match parsed {
        Some(value) => {
            let (score, was_clamped) = Score::clamped(value);
            if was_clamped {
                warn!("Model score '{raw}' out of range, clamped to {score}");
                warnings.push(ValidationWarning::ScoreClamped {
                    raw: raw.to_string(),
                    clamped_to: score.value(),
                });
            }
            score
        }
        None => {
            warn!("Model score '{raw}' is not a number, using 0");
            warnings.push(ValidationWarning::ScoreUnparsable {
                raw: raw.to_string(),
            });
            Score::clamped(0).0
        }
    }
}

fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    prefix: &str,
) -> Result<&'a Value, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(SchemaError::MissingField {
            field: field_path(prefix, field),
        }),
        Some(value) => Ok(value),
    }
}

fn require_string(obj: &Map<String, Value>, field: &str, prefix: &str) -> Result<String, SchemaError> {
    require(obj, field, prefix)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SchemaError::WrongType {
            field: field_path(prefix, field),
            expected: "a string",
        })
}

fn require_string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, SchemaError> {
    let items = require(obj, field, "")?
        .as_array()
        .ok_or_else(|| SchemaError::WrongType {
            field: field.to_string(),
            expected: "a list of strings",
        })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaError::WrongType {
                    field: format!("{field}[{i}]"),
                    expected: "a string",
                })
        })
        .collect()
}

/// Salary bounds are strings in the schema; bare JSON numbers are accepted too.
fn require_amount(obj: &Map<String, Value>, field: &str) -> Result<String, SchemaError> {
    match require(obj, field, "salary_estimation")? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(SchemaError::WrongType {
            field: field_path("salary_estimation", field),
            expected: "a string or number",
        }),
    }
}

fn require_salary(obj: &Map<String, Value>) -> Result<SalaryEstimation, SchemaError> {
    let salary = require(obj, "salary_estimation", "")?
        .as_object()
        .ok_or_else(|| SchemaError::WrongType {
            field: "salary_estimation".to_string(),
            expected: "an object",
        })?;

    Ok(SalaryEstimation {
        min: require_amount(salary, "min")?,
        max: require_amount(salary, "max")?,
        currency: require_string(salary, "currency", "salary_estimation")?,
        notes: require_string(salary, "notes", "salary_estimation")?,
    })
}

fn expect_at_least(
    field: &str,
    items: &[String],
    expected: usize,
    warnings: &mut Vec<ValidationWarning>,
) {
    if items.len() < expected {
        warn!("Model returned {} {field}, expected at least {expected}", items.len());
        warnings.push(ValidationWarning::FewerThanExpected {
            field: field.to_string(),
            expected,
            actual: items.len(),
        });
    }
}
