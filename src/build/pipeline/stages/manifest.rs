//! Page manifest generation.

use super::write::write_file;
use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError};

/// Writes `pages.json`: every written page, sorted by slug.
pub struct ManifestStage;

impl FinalizeStage for ManifestStage {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn finalize(&self, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let mut pages = ctx.pages.clone();
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));

        let mut json = serde_json::to_string_pretty(&pages)?;
        json.push('\n');
        write_file(&ctx.output_dir.join("pages.json"), &json)?;

        tracing::debug!(pages = pages.len(), "wrote page manifest");
        Ok(())
    }
}
