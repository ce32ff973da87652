//! Analysis pipeline: one submission in, one validated analysis out.
//!
//! Flow: extract resume text → build prompt → call model (once, under a
//! deadline) → validate. Extraction failures stop the pipeline before the
//! model is contacted.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::analysis::models::{AnalysisSettings, ValidatedAnalysis};
use crate::analysis::parser::{parse_analysis, SchemaError};
use crate::analysis::prompts::build_prompt;
use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::{extract_resume_text, DocumentExtractor};
use crate::llm_client::prompts::with_json_correction;
use crate::llm_client::{LlmError, TextGenerator};

/// Job descriptions beyond this many words are accepted but flagged.
pub const JD_WORD_GUIDANCE: usize = 2000;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub job_description: String,
    pub resume: Bytes,
    pub settings: AnalysisSettings,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub validated: ValidatedAnalysis,
    /// Request-level notes for the user, e.g. an overly long job description.
    pub notes: Vec<String>,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    extractor: Arc<dyn DocumentExtractor>,
    generator: Arc<dyn TextGenerator>,
    model_timeout: Duration,
    reprompt_on_schema_error: bool,
}

impl AnalysisPipeline {
    pub fn new(extractor: Arc<dyn DocumentExtractor>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            extractor,
            generator,
            model_timeout: Duration::from_secs(60),
            reprompt_on_schema_error: false,
        }
    }

    pub fn from_config(
        config: &Config,
        extractor: Arc<dyn DocumentExtractor>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self::new(extractor, generator)
            .with_model_timeout(config.model_timeout)
            .with_reprompt(config.reprompt_on_schema_error)
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_reprompt(mut self, enabled: bool) -> Self {
        self.reprompt_on_schema_error = enabled;
        self
    }

    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AppError> {
        let mut notes = Vec::new();

        let jd_words = request.job_description.split_whitespace().count();
        if jd_words > JD_WORD_GUIDANCE {
            warn!("Job description has {jd_words} words (guidance: {JD_WORD_GUIDANCE})");
            notes.push(format!(
                "Job description has {jd_words} words; results are best under {JD_WORD_GUIDANCE}."
            ));
        }

        let resume_text = extract_resume_text(self.extractor.clone(), request.resume).await?;

        let prompt = build_prompt(&resume_text, &request.job_description, request.settings);
        let raw = self.generate(&prompt).await?;

        let validated = match parse_analysis(&raw) {
            Ok(validated) => validated,
            Err(err) if self.reprompt_on_schema_error => {
                warn!("Model output failed validation ({err}), re-prompting once");
                let retry_prompt = with_json_correction(&prompt, &describe(&err));
                let raw = self.generate(&retry_prompt).await?;
                parse_analysis(&raw)?
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "Analysis complete: score={}, warnings={}",
            validated.result.score,
            validated.warnings.len()
        );

        Ok(AnalysisOutcome { validated, notes })
    }

    /// One model call under the configured deadline. A timed-out call is dropped.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        tokio::time::timeout(self.model_timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.model_timeout))?
    }
}

fn describe(err: &SchemaError) -> String {
    match err.field() {
        Some(field) => format!("{err} (check '{field}')"),
        None => err.to_string(),
    }
}
