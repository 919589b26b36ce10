use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::title_case;

// =============================================================================
// Content items (documents and static files)
// =============================================================================

/// One authored page: front matter plus the markdown body.
///
/// Read once per build and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    /// Unique identifier, also the output directory (`{slug}/index.html`)
    pub slug: String,
    /// Path relative to the content root (e.g., "lmm/random-slopes.md")
    pub source_path: PathBuf,
    /// Front matter metadata, passed through to templates and metadata
    pub front_matter: FrontMatter,
    /// The markdown body without the front matter block
    pub raw_markdown: String,
}

impl ContentDocument {
    /// Get the document title, falling back to the file name.
    pub fn title(&self) -> String {
        if let Some(title) = &self.front_matter.title {
            return title.clone();
        }

        let stem = self.source_path.file_stem().and_then(|s| s.to_str());
        let name = match stem {
            Some("index") => self
                .source_path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|s| s.to_str()),
            other => other,
        };
        name.map(title_case).unwrap_or_else(|| "Home".to_string())
    }
}

/// A file under the content root that is copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    /// Path relative to the content root (e.g., "images/trajectories.png")
    pub source_path: PathBuf,
}

/// Why a document did not render, recorded per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    /// The stage that failed ("read", "render", "template", "write", ...)
    pub stage: String,
    pub reason: String,
}

impl DocumentFailure {
    pub fn new(stage: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Navigation group
    pub category: Option<String>,
    /// Custom slug override
    pub slug: Option<String>,
    /// Additional arbitrary metadata (available in templates at top level, e.g., `page.author`)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` lines at the start of the
/// file:
///
/// ```markdown
/// ---
/// title: Random Slopes
/// category: LMM
/// tags: [lme4, reml]
/// ---
///
/// # Content starts here
/// ```
///
/// Invalid YAML is logged and ignored; the body is still rendered.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(after_opening) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    // The closing delimiter may also be the very first line (empty block).
    let (yaml, rest) = if let Some(rest) = after_opening.strip_prefix("---") {
        ("", rest)
    } else if let Some(pos) = after_opening.find("\n---") {
        (&after_opening[..pos], &after_opening[pos + 4..])
    } else {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    // Drop the remainder of the delimiter line and blank lines after it.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => "",
    };
    let body = body.trim_start_matches(['\n', '\r']);

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str(yaml) {
            Ok(fm) => fm,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse front matter, ignoring it");
                FrontMatter::default()
            }
        }
    };

    ParsedContent {
        front_matter,
        content: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(path: &str) -> ContentDocument {
        ContentDocument {
            slug: String::new(),
            source_path: PathBuf::from(path),
            front_matter: FrontMatter::default(),
            raw_markdown: String::new(),
        }
    }

    #[test]
    fn test_document_title_fallback() {
        assert_eq!(document("lmm/random-slopes.md").title(), "Random Slopes");
        assert_eq!(document("lgcm/index.md").title(), "Lgcm");
        assert_eq!(document("index.md").title(), "Home");
    }

    #[test]
    fn test_document_title_from_front_matter() {
        let mut doc = document("intro.md");
        doc.front_matter.title = Some("Welcome".to_string());
        assert_eq!(doc.title(), "Welcome");
    }

    #[test]
    fn test_parse_front_matter_basic() {
        let content = r#"---
title: Random Slopes
description: Letting effects vary by subject
category: LMM
tags:
  - lme4
  - reml
---

# Hello World
"#;
        let parsed = parse_front_matter(content);
        assert_eq!(parsed.front_matter.title.as_deref(), Some("Random Slopes"));
        assert_eq!(parsed.front_matter.category.as_deref(), Some("LMM"));
        assert_eq!(parsed.front_matter.tags, vec!["lme4", "reml"]);
        assert_eq!(parsed.content, "# Hello World\n");
    }

    #[test]
    fn test_parse_front_matter_with_custom_fields() {
        let content = "---\ntitle: Custom\nauthor: Jane Doe\n---\nContent here\n";
        let parsed = parse_front_matter(content);
        assert!(parsed.front_matter.extra.contains_key("author"));
        assert_eq!(parsed.content, "Content here\n");
    }

    #[test]
    fn test_parse_front_matter_no_front_matter() {
        let content = "# Just Markdown\n\n---\n\nA rule above.\n";
        let parsed = parse_front_matter(content);
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.content, content);
    }

    #[test]
    fn test_parse_front_matter_empty_block() {
        let parsed = parse_front_matter("---\n---\n\n# Content");
        assert_eq!(parsed.front_matter.title, None);
        assert_eq!(parsed.content, "# Content");
    }

    #[test]
    fn test_parse_front_matter_invalid_yaml() {
        let parsed = parse_front_matter("---\ntitle: [unclosed\n---\nBody\n");
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.content, "Body\n");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let content = "---\ntitle: x\n\nno closing line\n";
        assert_eq!(parse_front_matter(content).content, content);
    }
}
