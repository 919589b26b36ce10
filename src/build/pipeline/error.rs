//! Pipeline error types.

use crate::build::render::RenderError;
use crate::markdown::MarkdownError;

/// Errors that can occur during pipeline processing.
///
/// Per-document problems are normally recorded on the document instead;
/// these abort the whole run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("template error: {0}")]
    Render(#[from] RenderError),

    #[error("markdown rendering error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("document '{slug}' failed in stage '{stage}': {reason}")]
    DocumentFailed {
        slug: String,
        stage: String,
        reason: String,
    },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
