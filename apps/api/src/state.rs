use crate::analysis::pipeline::AnalysisPipeline;
use crate::analysis::session::SessionRegistry;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Extractor and model client behind trait objects; stubs in tests.
    pub pipeline: AnalysisPipeline,
    /// Per-session view-models, in memory only.
    pub sessions: SessionRegistry,
    pub config: Config,
}
