//! View-model types: what the single-page UI renders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::models::{AnalysisResult, ValidatedAnalysis};
use crate::analysis::report::render_report;
use crate::errors::AppError;

/// Rendered projection of a validated analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub score_label: String,
    pub score: u8,
    /// 0.0 – 1.0, drives the progress bar.
    pub progress: f32,
    pub missing_keywords: Vec<String>,
    pub existing_keywords: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub suggestions: Vec<String>,
    pub salary_range: String,
    pub salary_notes: String,
    pub summary: String,
    pub warnings: Vec<String>,
    pub report: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisView {
    pub fn from_result(result: &AnalysisResult, warnings: Vec<String>) -> Self {
        Self {
            score_label: result.score.to_string(),
            score: result.score.value(),
            progress: result.score.progress(),
            missing_keywords: result.missing_keywords.clone(),
            existing_keywords: result.existing_keywords.clone(),
            skill_gaps: result.skill_gaps.clone(),
            suggestions: result.suggestions.clone(),
            salary_range: result.salary_estimation.range_line(),
            salary_notes: result.salary_estimation.notes.clone(),
            summary: result.summary.clone(),
            warnings,
            report: render_report(result),
            analyzed_at: Utc::now(),
        }
    }

    /// Builds the view, merging validation warnings with request-level notes.
    pub fn from_validated(validated: &ValidatedAnalysis, mut notes: Vec<String>) -> Self {
        notes.extend(validated.warnings.iter().map(ToString::to_string));
        Self::from_result(&validated.result, notes)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    pub message: String,
    pub hint: Option<&'static str>,
}

impl From<&AppError> for ErrorView {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code(),
            message: err.public_message(),
            hint: err.hint(),
        }
    }
}

/// Explicit UI state for one session. Replaced wholesale by each request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionView {
    #[default]
    Idle,
    Analyzing {
        request_id: u64,
    },
    Ready {
        request_id: u64,
        analysis: Box<AnalysisView>,
    },
    Failed {
        request_id: u64,
        error: ErrorView,
    },
}

impl SessionView {
    pub fn is_analyzing(&self) -> bool {
        matches!(self, SessionView::Analyzing { .. })
    }

    pub fn report(&self) -> Option<&str> {
        match self {
            SessionView::Ready { analysis, .. } => Some(&analysis.report),
            _ => None,
        }
    }
}

/// Response body for one analysis submission.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: Uuid,
    pub request_id: u64,
    pub analysis: AnalysisView,
}
