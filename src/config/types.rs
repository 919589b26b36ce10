//! Configuration type definitions.
//!
//! This module contains all the data structures read from `longform.yaml`.
//! These types are pure data - no I/O or complex logic. Every field has a
//! default, so an empty (or missing) config file is a valid site.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Top-level config
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub markdown: MarkdownConfig,
    pub build: BuildConfig,
    pub suggestions: SuggestionsConfig,
    pub theme: ThemeConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Absolute site URL, used for canonical links when set
    pub url: Option<String>,
    /// URL prefix the site is served under (e.g. `/tutorials/`)
    pub base_path: String,
    /// Directory holding the markdown sources (relative to the config file)
    pub content: PathBuf,
    /// Output directory (relative to the config file)
    pub output: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Tutorials".to_string(),
            url: None,
            base_path: "/".to_string(),
            content: PathBuf::from("content"),
            output: PathBuf::from("dist"),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    pub extensions: Vec<String>,
    /// Autumnus theme used for `assets/highlight.css`
    pub highlight_theme: String,
    /// Recognised callout markers
    pub callouts: Vec<CalloutDef>,
    /// Heading titles that open a collapsible module
    pub modules: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_module_titles() -> Vec<String> {
    [
        "Worked Example",
        "Reference",
        "References",
        "References & Resources",
        "References and Resources",
    ]
    .iter()
    .map(|title| title.to_string())
    .collect()
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            highlight_theme: "dracula".to_string(),
            callouts: CalloutDef::defaults(),
            modules: default_module_titles(),
        }
    }
}

/// One recognised callout kind.
///
/// ```yaml
/// callouts:
///   - name: pitfall
///     aliases: [caution]
///   - name: didactic
///     title: Why it works
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutDef {
    /// Marker name, matched case-insensitively (`[!tip]`, `**Tip:**`)
    pub name: String,
    /// Display title (defaults to the capitalised name)
    #[serde(default)]
    pub title: Option<String>,
    /// Extra markers mapped onto this kind
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CalloutDef {
    fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<CalloutDef> {
        vec![
            CalloutDef::new("tip", &[]),
            CalloutDef::new("warning", &["important"]),
            CalloutDef::new("note", &[]),
            CalloutDef::new("pitfall", &["caution"]),
            CalloutDef::new("info", &[]),
            CalloutDef::new("didactic", &[]),
        ]
    }

    /// Whether `marker` names this callout (name or alias, any case).
    pub fn matches(&self, marker: &str) -> bool {
        let marker = marker.trim();
        self.name.eq_ignore_ascii_case(marker)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(marker))
    }

    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => crate::util::title_case(&self.name),
        }
    }

    /// CSS class suffix (`callout-{class}`)
    pub fn class(&self) -> String {
        self.name.to_lowercase()
    }
}

// =============================================================================
// Build configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub on_error: OnError,
}

/// What to do with a document that fails to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Log the failure and omit the page
    #[default]
    Skip,
    /// Log the failure and write a page with a visible error notice
    Placeholder,
    /// Abort the build
    Fail,
}

// =============================================================================
// Suggestions configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub enabled: bool,
    /// Endpoint the edit-suggestion widget posts to
    pub endpoint: String,
    /// Which representation seeds the editor
    pub prefill: PrefillFormat,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/api/suggestions".to_string(),
            prefill: PrefillFormat::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefillFormat {
    #[default]
    Markdown,
    Html,
}

// =============================================================================
// Theme configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Directory of Tera templates overriding the built-in page template
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.site.base_path, "/");
        assert_eq!(config.site.output, PathBuf::from("dist"));
        assert_eq!(config.build.on_error, OnError::Skip);
        assert_eq!(config.suggestions.prefill, PrefillFormat::Markdown);
        assert_eq!(config.markdown.callouts.len(), 6);
        assert!(config.markdown.modules.contains(&"Worked Example".to_string()));
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let yaml = r#"
site:
  name: Longitudinal Methods
build:
  on_error: placeholder
markdown:
  modules: [Exercises]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.site.name, "Longitudinal Methods");
        assert_eq!(config.site.content, PathBuf::from("content"));
        assert_eq!(config.build.on_error, OnError::Placeholder);
        assert_eq!(config.markdown.modules, vec!["Exercises".to_string()]);
        assert_eq!(config.markdown.highlight_theme, "dracula");
    }

    #[test]
    fn test_callout_matching() {
        let defaults = CalloutDef::defaults();
        let warning = defaults.iter().find(|d| d.name == "warning").unwrap();
        assert!(warning.matches("WARNING"));
        assert!(warning.matches("important"));
        assert!(!warning.matches("tip"));
        assert_eq!(warning.display_title(), "Warning");
        assert_eq!(warning.class(), "warning");
    }

    #[test]
    fn test_callout_custom_title() {
        let def: CalloutDef =
            serde_yaml::from_str("name: didactic\ntitle: Why it works\n").unwrap();
        assert_eq!(def.display_title(), "Why it works");
        assert!(def.aliases.is_empty());
    }
}
