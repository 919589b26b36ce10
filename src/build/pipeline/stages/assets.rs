//! Build-wide asset generation.

use super::write::write_file;
use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError};
use crate::markdown::SyntaxHighlighter;

/// Writes `assets/highlight.css` for the configured highlight theme.
pub struct HighlightCssStage;

impl FinalizeStage for HighlightCssStage {
    fn name(&self) -> &'static str {
        "highlight-css"
    }

    fn finalize(&self, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let highlighter = SyntaxHighlighter::new(&ctx.config.markdown.highlight_theme);
        let Some(css) = highlighter.generate_css() else {
            tracing::warn!(
                theme = highlighter.theme_name(),
                "unknown highlight theme, no stylesheet written"
            );
            return Ok(());
        };

        write_file(&ctx.output_dir.join("assets/highlight.css"), &css)?;
        Ok(())
    }
}
