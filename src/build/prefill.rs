//! Content hashing and edit-suggestion metadata.
//!
//! The hash is taken over the rendered HTML fragment, so source edits that do
//! not change the output (front matter, trailing whitespace) keep the same
//! baseline.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::document::ContentDocument;
use crate::config::{PrefillFormat, SuggestionsConfig};
use crate::markdown::{MarkdownOutput, Outline};

/// The output of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub html: String,
    pub outline: Outline,
    /// Hex SHA-256 of `html`
    pub content_hash: String,
}

impl From<MarkdownOutput> for RenderResult {
    fn from(output: MarkdownOutput) -> Self {
        let content_hash = content_hash(&output.html);
        Self {
            html: output.html,
            outline: output.outline,
            content_hash,
        }
    }
}

/// Hex-encoded SHA-256 of the UTF-8 bytes of `html`.
pub fn content_hash(html: &str) -> String {
    hex::encode(Sha256::digest(html.as_bytes()))
}

/// Data handed to the suggest-an-edit widget on each page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionPrefill {
    pub slug: String,
    pub page_url: String,
    /// Endpoint submissions are posted to
    pub endpoint: String,
    pub prefill_format: PrefillFormat,
    /// Markdown body or rendered HTML, per `prefill_format`
    pub prefill: String,
    /// Always the page's `content_hash` from the same build
    pub baseline_hash: String,
}

impl SuggestionPrefill {
    pub fn new(
        doc: &ContentDocument,
        page_url: &str,
        result: &RenderResult,
        config: &SuggestionsConfig,
    ) -> Self {
        let prefill = match config.prefill {
            PrefillFormat::Markdown => doc.raw_markdown.clone(),
            PrefillFormat::Html => result.html.clone(),
        };
        Self {
            slug: doc.slug.clone(),
            page_url: page_url.to_string(),
            endpoint: config.endpoint.clone(),
            prefill_format: config.prefill,
            prefill,
            baseline_hash: result.content_hash.clone(),
        }
    }
}

/// Per-page metadata written to `{slug}/meta.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PageMetadata {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub page_url: String,
    pub outline: Outline,
    pub content_hash: String,
    pub suggestion: Option<SuggestionPrefill>,
}

impl PageMetadata {
    pub fn new(
        doc: &ContentDocument,
        page_url: &str,
        result: &RenderResult,
        config: &SuggestionsConfig,
    ) -> Self {
        let suggestion = config
            .enabled
            .then(|| SuggestionPrefill::new(doc, page_url, result, config));
        Self {
            slug: doc.slug.clone(),
            title: doc.title(),
            description: doc.front_matter.description.clone(),
            tags: doc.front_matter.tags.clone(),
            category: doc.front_matter.category.clone(),
            page_url: page_url.to_string(),
            outline: result.outline.clone(),
            content_hash: result.content_hash.clone(),
            suggestion,
        }
    }
}

/// Serialize a value for a `<script type="application/json">` element.
///
/// `</` is escaped so the payload cannot close the script element early.
pub fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::{FrontMatter, parse_front_matter};
    use crate::config::MarkdownConfig;
    use crate::markdown::render_markdown;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn document(source: &str) -> ContentDocument {
        let parsed = parse_front_matter(source);
        ContentDocument {
            slug: "lmm/random-slopes".to_string(),
            source_path: PathBuf::from("lmm/random-slopes.md"),
            front_matter: parsed.front_matter,
            raw_markdown: parsed.content,
        }
    }

    fn render(doc: &ContentDocument) -> RenderResult {
        render_markdown(&doc.raw_markdown, &MarkdownConfig::default())
            .unwrap()
            .into()
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_hash("<p>x</p>\n"), content_hash("<p>x</p>\n"));
        assert_ne!(content_hash("<p>x</p>\n"), content_hash("<p>y</p>\n"));
    }

    #[test]
    fn test_front_matter_change_keeps_hash() {
        let before = document("---\ndescription: old\n---\n# Slopes\n\nBody.\n");
        let after = document("---\ndescription: new\n---\n# Slopes\n\nBody.\n");
        assert_eq!(render(&before).content_hash, render(&after).content_hash);
    }

    #[test]
    fn test_body_change_changes_hash() {
        let before = document("# Slopes\n\nBody.\n");
        let after = document("# Slopes\n\nBody!\n");
        assert_ne!(render(&before).content_hash, render(&after).content_hash);
    }

    #[test]
    fn test_baseline_hash_matches_content_hash() {
        let doc = document("# Slopes\n\nBody.\n");
        let result = render(&doc);
        let meta = PageMetadata::new(
            &doc,
            "/lmm/random-slopes/",
            &result,
            &SuggestionsConfig::default(),
        );

        let suggestion = meta.suggestion.unwrap();
        assert_eq!(suggestion.baseline_hash, result.content_hash);
        assert_eq!(suggestion.prefill, "# Slopes\n\nBody.\n");
        assert_eq!(suggestion.prefill_format, PrefillFormat::Markdown);
        assert_eq!(suggestion.endpoint, "/api/suggestions");
    }

    #[test]
    fn test_html_prefill() {
        let doc = document("Body.\n");
        let result = render(&doc);
        let config = SuggestionsConfig {
            prefill: PrefillFormat::Html,
            ..Default::default()
        };
        let prefill = SuggestionPrefill::new(&doc, "/x/", &result, &config);
        assert_eq!(prefill.prefill, "<p>Body.</p>\n");
    }

    #[test]
    fn test_suggestions_disabled() {
        let doc = ContentDocument {
            slug: "a".to_string(),
            source_path: PathBuf::from("a.md"),
            front_matter: FrontMatter::default(),
            raw_markdown: String::new(),
        };
        let result = render(&doc);
        let config = SuggestionsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(PageMetadata::new(&doc, "/a/", &result, &config).suggestion.is_none());
    }

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let json = script_json(&"</script><script>alert(1)</script>").unwrap();
        assert!(!json.contains("</"));
        assert_eq!(json, "\"<\\/script><script>alert(1)<\\/script>\"");
    }
}
