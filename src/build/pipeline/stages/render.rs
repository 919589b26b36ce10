//! Content rendering stage.

use rayon::prelude::*;

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::markdown::render_with;

/// Stage that renders each document's markdown to an HTML fragment.
///
/// Documents are independent, so they are rendered in parallel. After this
/// stage `doc.result` holds the HTML, the outline and the content hash.
pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let markdown = &ctx.config.markdown;
        let transforms = ctx.transforms;

        docs.par_iter_mut()
            .filter(|doc| !doc.is_failed())
            .for_each(|doc| {
                match render_with(&doc.doc.raw_markdown, markdown, transforms) {
                    Ok(output) => doc.result = Some(output.into()),
                    Err(e) => doc.fail("render", e),
                }
            });

        Ok(())
    }
}
