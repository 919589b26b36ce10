//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative paths within the content directory)
//! - Slugs (the unique page identifier)
//! - Page URLs (where the page is served, under the site base path)
//! - Output file paths (where files are written in the output directory)

use std::path::{Path, PathBuf};

/// Derive a slug from a markdown file path.
///
/// Removes the extension and turns `index` files into their directory. The
/// root `index.md` has the empty slug.
///
/// # Examples
/// ```ignore
/// slug_from_path("lmm/random-slopes.md") => "lmm/random-slopes"
/// slug_from_path("lgcm/index.md") => "lgcm"
/// slug_from_path("index.md") => ""
/// ```
pub fn slug_from_path(path: &Path) -> String {
    let path_str = path.with_extension("").to_string_lossy().replace('\\', "/");

    if path_str == "index" {
        String::new()
    } else if let Some(dir) = path_str.strip_suffix("/index") {
        dir.to_string()
    } else {
        path_str
    }
}

/// Normalize a slug given in front matter.
///
/// Empty and `.` segments are dropped. A `..` segment would place the page
/// outside the output directory, so such a slug is rejected.
pub fn normalize_slug(slug: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in slug.trim().split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => segments.push(segment),
        }
    }
    Some(segments.join("/"))
}

/// The URL a page is served at.
///
/// `base_path` is expected to start and end with `/`.
///
/// # Examples
/// ```ignore
/// page_url("/", "lmm/random-slopes") => "/lmm/random-slopes/"
/// page_url("/tutorials/", "") => "/tutorials/"
/// ```
pub fn page_url(base_path: &str, slug: &str) -> String {
    if slug.is_empty() {
        base_path.to_string()
    } else {
        format!("{base_path}{slug}/")
    }
}

/// Directory holding a page's `index.html` and `meta.json`.
pub fn page_output_dir(slug: &str, output_dir: &Path) -> PathBuf {
    if slug.is_empty() {
        output_dir.to_path_buf()
    } else {
        output_dir.join(slug)
    }
}

/// Output location of a static file; static files keep their relative path.
pub fn static_output_path(path: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_slug_from_path_simple() {
        assert_eq!(slug_from_path(Path::new("overview.md")), "overview");
    }

    #[test]
    fn test_slug_from_path_nested() {
        assert_eq!(
            slug_from_path(Path::new("lmm/random-slopes.markdown")),
            "lmm/random-slopes"
        );
    }

    #[test]
    fn test_slug_from_path_index() {
        assert_eq!(slug_from_path(Path::new("index.md")), "");
        assert_eq!(slug_from_path(Path::new("lgcm/index.md")), "lgcm");
        assert_eq!(slug_from_path(Path::new("lgcm/reindex.md")), "lgcm/reindex");
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("/custom/slug/").as_deref(), Some("custom/slug"));
        assert_eq!(normalize_slug(" plain ").as_deref(), Some("plain"));
        assert_eq!(normalize_slug("./a//b/").as_deref(), Some("a/b"));
    }

    #[test]
    fn test_normalize_slug_rejects_parent_segments() {
        assert_eq!(normalize_slug("../x"), None);
        assert_eq!(normalize_slug("a/../../x"), None);
        assert_eq!(normalize_slug("a\\..\\x"), None);
    }

    #[test]
    fn test_page_url() {
        assert_eq!(page_url("/", "lmm/random-slopes"), "/lmm/random-slopes/");
        assert_eq!(page_url("/tutorials/", "overview"), "/tutorials/overview/");
        assert_eq!(page_url("/tutorials/", ""), "/tutorials/");
    }

    #[test]
    fn test_page_output_dir() {
        let output = Path::new("/site");
        assert_eq!(
            page_output_dir("lmm/random-slopes", output),
            PathBuf::from("/site/lmm/random-slopes")
        );
        assert_eq!(page_output_dir("", output), PathBuf::from("/site"));
    }

    #[test]
    fn test_static_output_path() {
        assert_eq!(
            static_output_path(Path::new("images/fit.png"), Path::new("/site")),
            PathBuf::from("/site/images/fit.png")
        );
    }
}
