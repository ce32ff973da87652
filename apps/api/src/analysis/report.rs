//! Plain-text report offered as a download.

use std::fmt::Write;

use crate::analysis::models::AnalysisResult;

pub const REPORT_FILENAME: &str = "ats_report.txt";
/// Items that themselves contain ", " cannot be split back apart.
pub const LIST_SEPARATOR: &str = ", ";
pub const SUGGESTION_PREFIX: &str = "- ";

pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("Smart ATS Pro Report\n");
    out.push_str("-------------------\n");
    let _ = writeln!(out, "Score: {}", result.score);
    let _ = writeln!(
        out,
        "Missing Keywords: {}",
        join_items(&result.missing_keywords)
    );
    let _ = writeln!(out, "Skill Gaps: {}", join_items(&result.skill_gaps));
    out.push_str("Suggestions:\n");
    for suggestion in &result.suggestions {
        let _ = writeln!(out, "{SUGGESTION_PREFIX}{}", single_line(suggestion));
    }
    let _ = writeln!(
        out,
        "Salary Estimation: {}",
        single_line(&result.salary_estimation.range_line())
    );
    out
}

fn join_items(items: &[String]) -> String {
    items
        .iter()
        .map(|item| single_line(item))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Folds embedded line breaks into single spaces so each item stays on its line.
fn single_line(text: &str) -> String {
    if !text.contains(['\r', '\n']) {
        return text.to_string();
    }
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
