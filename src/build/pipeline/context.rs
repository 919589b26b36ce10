//! Pipeline context for sharing state across stages.

use std::path::Path;

use serde::Serialize;

use crate::build::render::{NavSection, Renderer, SiteContext};
use crate::config::Config;
use crate::markdown::TransformPipeline;

/// One entry of the `pages.json` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub slug: String,
    pub title: String,
    pub category: Option<String>,
    pub page_url: String,
    pub content_hash: String,
}

/// Shared context for pipeline stages.
///
/// Contains all resources and configuration needed by stages during processing.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    /// The loaded configuration (markdown, suggestions, failure policy)
    pub config: &'a Config,

    // === Site-level data ===
    /// Site metadata (name, URL, base path)
    pub site: &'a SiteContext,

    /// Navigation shared by every page
    pub nav: &'a [NavSection],

    // === Services ===
    /// Markdown transform stages, shared across worker threads
    pub transforms: &'a TransformPipeline,

    /// Template renderer
    pub renderer: &'a Renderer,

    // === Results ===
    /// Pages written so far, in document order
    pub pages: Vec<PageSummary>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        output_dir: &'a Path,
        config: &'a Config,
        site: &'a SiteContext,
        nav: &'a [NavSection],
        transforms: &'a TransformPipeline,
        renderer: &'a Renderer,
    ) -> Self {
        Self {
            output_dir,
            config,
            site,
            nav,
            transforms,
            renderer,
            pages: Vec::new(),
        }
    }
}
