//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::AnalysisSettings;
use crate::analysis::pipeline::AnalysisRequest;
use crate::analysis::report::REPORT_FILENAME;
use crate::analysis::view::{AnalysisView, AnalyzeResponse, SessionView};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

/// Fields of one multipart submission.
#[derive(Debug)]
pub struct AnalyzeForm {
    pub session_id: Uuid,
    pub request: AnalysisRequest,
}

impl AnalyzeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut job_description: Option<String> = None;
        let mut resume: Option<Bytes> = None;
        let mut session_id: Option<Uuid> = None;
        let mut settings = AnalysisSettings::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "job_description" => {
                    job_description = Some(field.text().await.map_err(bad_multipart)?);
                }
                "resume" => {
                    resume = Some(field.bytes().await.map_err(bad_multipart)?);
                }
                "session_id" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    if !text.trim().is_empty() {
                        session_id = Some(Uuid::parse_str(text.trim()).map_err(|_| {
                            AppError::Validation("session_id must be a UUID".to_string())
                        })?);
                    }
                }
                "analysis_depth" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    settings.depth = text.parse().map_err(AppError::Validation)?;
                }
                "industry" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    settings.industry = text.parse().map_err(AppError::Validation)?;
                }
                other => warn!("Ignoring unexpected form field '{other}'"),
            }
        }

        let job_description = job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or_else(|| AppError::Validation("job_description cannot be empty".to_string()))?;
        let resume = resume
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| AppError::Validation("resume PDF is required".to_string()))?;

        Ok(Self {
            session_id: session_id.unwrap_or_else(Uuid::new_v4),
            request: AnalysisRequest {
                job_description,
                resume,
                settings,
            },
        })
    }
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form upload: {}", err.body_text()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Runs one analysis for a session. Rejected with 409 while the session
/// already has one outstanding.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = AnalyzeForm::from_multipart(multipart).await?;
    let ticket = state.sessions.begin(form.session_id)?;
    let session_id = ticket.session_id();
    let request_id = ticket.request_id();

    info!(
        "Analyzing resume ({} bytes) for session {session_id}, request {request_id}",
        form.request.resume.len()
    );

    match state.pipeline.run(form.request).await {
        Ok(outcome) => {
            let analysis = AnalysisView::from_validated(&outcome.validated, outcome.notes);
            if !ticket.succeed(analysis.clone()) {
                warn!("Session {session_id}: request {request_id} finished after being superseded");
            }
            Ok(Json(AnalyzeResponse {
                session_id,
                request_id,
                analysis,
            }))
        }
        Err(err) => {
            ticket.fail(&err);
            Err(err)
        }
    }
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    state
        .sessions
        .view(session_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.reset(session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {session_id} not found")))
    }
}

/// GET /api/v1/sessions/:id/report
///
/// Plain-text report of the session's latest successful analysis, as a download.
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .sessions
        .view(session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    if view.is_analyzing() {
        return Err(AppError::AnalysisInProgress);
    }
    let report = view
        .report()
        .ok_or_else(|| AppError::NotFound("No report available for this session".to_string()))?
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILENAME}\""),
            ),
        ],
        report,
    ))
}
