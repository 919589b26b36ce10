//! Page template rendering stage.
//!
//! Wraps rendered HTML content in the page template,
//! adding navigation, the table of contents and the suggestion widget data.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::build::prefill::{SuggestionPrefill, script_json};
use crate::build::render::{PageContext, PageInfo, RenderError, SuggestionContext};
use crate::config::OnError;

/// Stage that applies the page template to rendered content.
///
/// After this stage, `doc.output_html` contains the complete HTML page. With
/// the `placeholder` failure policy, failed documents get a page with a
/// visible render error instead.
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            if !doc.is_failed() {
                match render_page(doc, ctx) {
                    Ok(html) => {
                        doc.output_html = Some(html);
                        continue;
                    }
                    Err(e) => doc.fail("template", e),
                }
            }

            if ctx.config.build.on_error == OnError::Placeholder {
                match render_placeholder(doc, ctx) {
                    Ok(html) => doc.output_html = Some(html),
                    Err(e) => {
                        tracing::warn!(slug = doc.slug(), error = %e, "placeholder page failed")
                    }
                }
            }
        }

        Ok(())
    }
}

fn page_info(doc: &ProcessingDocument) -> PageInfo {
    let fm = &doc.doc.front_matter;
    PageInfo {
        slug: doc.slug().to_string(),
        title: doc.doc.title(),
        url: doc.page_url.clone(),
        description: fm.description.clone(),
        tags: fm.tags.clone(),
        category: fm.category.clone(),
        content_hash: doc.result.as_ref().map(|r| r.content_hash.clone()),
        extra: fm.extra.clone(),
    }
}

fn render_page(doc: &ProcessingDocument, ctx: &PipelineContext) -> Result<String, PipelineError> {
    let result = doc.result.as_ref().ok_or_else(|| {
        PipelineError::stage(
            "template",
            format!("document '{}' has no rendered content (was render stage run?)", doc.slug()),
        )
    })?;

    let suggestions = &ctx.config.suggestions;
    let suggestion = if suggestions.enabled {
        let prefill = SuggestionPrefill::new(&doc.doc, &doc.page_url, result, suggestions);
        Some(SuggestionContext {
            endpoint: suggestions.endpoint.clone(),
            data_json: script_json(&prefill)?,
        })
    } else {
        None
    };

    let page_context = PageContext {
        site: ctx.site.clone(),
        page: page_info(doc),
        content: result.html.clone(),
        nav: ctx.nav.to_vec(),
        toc: result.outline.tree(),
        suggestion,
        render_error: None,
    };

    Ok(ctx.renderer.render_page(&page_context)?)
}

fn render_placeholder(doc: &ProcessingDocument, ctx: &PipelineContext) -> Result<String, RenderError> {
    let render_error = doc
        .failure
        .as_ref()
        .map(|f| format!("{}: {}", f.stage, f.reason));

    let mut page = page_info(doc);
    page.content_hash = None;

    ctx.renderer.render_page(&PageContext {
        site: ctx.site.clone(),
        page,
        content: String::new(),
        nav: ctx.nav.to_vec(),
        toc: Vec::new(),
        suggestion: None,
        render_error,
    })
}
