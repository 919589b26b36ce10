//! File writing stage.
//!
//! Writes the final HTML output and page metadata to the filesystem.

use std::path::Path;

use crate::build::paths::page_output_dir;
use crate::build::pipeline::{
    PageSummary, PipelineContext, PipelineError, ProcessingDocument, Stage,
};
use crate::build::prefill::PageMetadata;

/// Stage that writes rendered documents to the output directory.
///
/// Each page goes to `{slug}/index.html`. Successfully rendered pages also
/// get `{slug}/meta.json` and an entry in the manifest; placeholder pages
/// get neither.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let Some(html) = &doc.output_html else {
                continue;
            };

            let dir = page_output_dir(doc.slug(), ctx.output_dir);
            if let Err(e) = write_file(&dir.join("index.html"), html) {
                doc.fail("write", e);
                continue;
            }

            if doc.is_failed() {
                continue;
            }
            let Some(result) = &doc.result else {
                continue;
            };

            let metadata =
                PageMetadata::new(&doc.doc, &doc.page_url, result, &ctx.config.suggestions);
            let mut json = serde_json::to_string_pretty(&metadata)?;
            json.push('\n');
            if let Err(e) = write_file(&dir.join("meta.json"), &json) {
                doc.fail("write", e);
                continue;
            }

            ctx.pages.push(PageSummary {
                slug: metadata.slug,
                title: metadata.title,
                category: metadata.category,
                page_url: metadata.page_url,
                content_hash: metadata.content_hash,
            });
        }

        Ok(())
    }
}

/// Write a file, creating parent directories if needed.
pub(super) fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
