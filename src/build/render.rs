use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::markdown::OutlineNode;

/// The page template shipped with the binary.
const BUILTIN_PAGE: &str = include_str!("../../templates/page.html");

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    #[error("theme {0} has no page.html template")]
    MissingPageTemplate(String),
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Create a renderer using the built-in page template.
    pub fn builtin() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template("page.html", BUILTIN_PAGE)?;
        Ok(Self { tera })
    }

    /// Create a new renderer loading templates from the given theme directory.
    ///
    /// The directory must contain a `page.html`; other templates may be used
    /// by it through `extends` or `include`.
    pub fn new(theme_path: &Path) -> Result<Self, RenderError> {
        if !theme_path.is_dir() {
            return Err(RenderError::ThemeNotFound(theme_path.display().to_string()));
        }

        let glob = theme_path.join("**/*.html");
        let glob_str = glob.to_string_lossy();
        let tera = Tera::new(&glob_str)?;

        if !tera.get_template_names().any(|name| name == "page.html") {
            return Err(RenderError::MissingPageTemplate(
                theme_path.display().to_string(),
            ));
        }

        Ok(Self { tera })
    }

    /// Create the renderer for an optional theme directory.
    pub fn for_theme(theme_path: Option<&Path>) -> Result<Self, RenderError> {
        match theme_path {
            Some(path) => Self::new(path),
            None => Self::builtin(),
        }
    }

    /// Render a page with the given context.
    pub fn render_page(&self, context: &PageContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("page", &context.page);
        tera_context.insert("content", &context.content);
        tera_context.insert("nav", &context.nav);
        tera_context.insert("toc", &context.toc);
        tera_context.insert("suggestion", &context.suggestion);
        tera_context.insert("render_error", &context.render_error);

        Ok(self.tera.render("page.html", &tera_context)?)
    }
}

/// Context passed to page templates.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub site: SiteContext,
    pub page: PageInfo,
    /// Rendered HTML fragment (empty for error placeholders)
    pub content: String,
    pub nav: Vec<NavSection>,
    /// Table of contents for the current page
    pub toc: Vec<OutlineNode>,
    pub suggestion: Option<SuggestionContext>,
    /// Set on placeholder pages for documents that failed to render
    pub render_error: Option<String>,
}

/// Site-level information.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    pub name: String,
    pub url: Option<String>,
    pub base_path: String,
}

/// Information about the current page.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub slug: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub content_hash: Option<String>,
    /// Custom front matter fields (flattened to top level, e.g., `page.author`)
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_yaml::Value>,
}

/// What the edit-suggestion widget needs.
#[derive(Debug, Serialize)]
pub struct SuggestionContext {
    pub endpoint: String,
    /// The prefill record as JSON, safe to place inside a script element
    pub data_json: String,
}

/// A navigation section (group of links).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NavSection {
    /// A section with a title and nested items
    Section { section: String, items: Vec<NavLink> },
    /// A standalone link (no section header)
    Link(NavLink),
}

/// A single navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}
