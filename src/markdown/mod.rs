//! The content pipeline: markdown source to an HTML fragment and outline.
//!
//! ```text
//! source ─► preprocess_math ─► parser ─► collect_outline / stamp_anchors
//!        ─► callouts ─► tables ─► modules ─► math ─► code-blocks ─► emit_html
//! ```
//!
//! Every step is a pure function of its input, so rendering the same source
//! with the same configuration always yields the same bytes.

mod callouts;
mod code_blocks;
mod emit;
mod headings;
mod highlight;
mod math;
mod modules;
mod stream;
mod tables;
mod transform;

use pulldown_cmark::{Options, Parser};

pub use emit::emit_html;
pub use headings::{AnchorRegistry, Outline, OutlineEntry, OutlineNode, collect_outline, slugify};
pub use highlight::SyntaxHighlighter;
pub use math::{MathStage, math_markup, preprocess_math, render_latex};
pub use stream::{Container, EventStream, StreamError, StreamEvent, check_balanced, from_parser};
pub use transform::{Transform, TransformError, TransformPipeline};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Result of rendering markdown: the HTML fragment and its outline.
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    pub html: String,
    pub outline: Outline,
}

/// Parser options for the configured extensions.
pub fn parser_options(config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render a markdown body to HTML with the default transform pipeline.
pub fn render_markdown(
    markdown: &str,
    config: &MarkdownConfig,
) -> Result<MarkdownOutput, MarkdownError> {
    let pipeline = TransformPipeline::from_config(config);
    render_with(markdown, config, &pipeline)
}

/// Render a markdown body through a caller-supplied transform pipeline.
pub fn render_with(
    markdown: &str,
    config: &MarkdownConfig,
    pipeline: &TransformPipeline,
) -> Result<MarkdownOutput, MarkdownError> {
    let options = parser_options(config)?;
    let source = preprocess_math(markdown);

    let events = from_parser(Parser::new_ext(&source, options));
    let outline = collect_outline(&events);
    let events = headings::stamp_anchors(events, &outline);
    let events = pipeline.run(events);

    Ok(MarkdownOutput {
        html: emit_html(events),
        outline,
    })
}
