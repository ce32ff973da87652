// Resume analysis: prompt → model → validation → view.
// All model calls go through llm_client; no direct Gemini calls here.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod session;
pub mod view;
