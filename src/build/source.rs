use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::document::{ContentDocument, DocumentFailure, StaticFile, parse_front_matter};
use super::paths::{normalize_slug, slug_from_path};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("content path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Discovery
// =============================================================================

/// Everything found under the content directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Documents with unique slugs, sorted by slug
    pub documents: Vec<ContentDocument>,
    /// Static files, sorted by path
    pub static_files: Vec<StaticFile>,
    /// Documents that could not be read or claimed a taken slug
    pub failures: Vec<(String, DocumentFailure)>,
}

/// The content directory of the site.
#[derive(Debug, Clone)]
pub struct ContentSource {
    root: PathBuf,
}

impl ContentSource {
    /// Open a content directory, checking it exists.
    pub fn open(root: &Path) -> Result<Self, SourceError> {
        if !root.exists() {
            return Err(SourceError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover all content.
    ///
    /// Walks the directory tree in sorted order. A file that cannot be read
    /// is recorded as a failure rather than aborting discovery, as is a
    /// document whose slug was already taken by an earlier path.
    pub fn discover(&self) -> Result<Discovery, SourceError> {
        let mut files = Vec::new();
        self.walk_directory(&self.root, &PathBuf::new(), &mut files)?;
        files.sort();

        let mut discovery = Discovery::default();
        let mut by_slug: BTreeMap<String, ContentDocument> = BTreeMap::new();

        for relative in files {
            if !is_markdown(&relative) {
                discovery.static_files.push(StaticFile {
                    source_path: relative,
                });
                continue;
            }

            let path_slug = slug_from_path(&relative);
            let raw = match std::fs::read_to_string(self.root.join(&relative)) {
                Ok(raw) => raw,
                Err(e) => {
                    discovery
                        .failures
                        .push((path_slug, DocumentFailure::new("read", e)));
                    continue;
                }
            };

            let parsed = parse_front_matter(&raw);
            let slug = match &parsed.front_matter.slug {
                Some(raw_slug) => match normalize_slug(raw_slug) {
                    Some(slug) => slug,
                    None => {
                        discovery.failures.push((
                            path_slug,
                            DocumentFailure::new(
                                "discover",
                                format!("invalid slug '{raw_slug}' (parent segments are not allowed)"),
                            ),
                        ));
                        continue;
                    }
                },
                None => path_slug,
            };

            if let Some(existing) = by_slug.get(&slug) {
                discovery.failures.push((
                    slug,
                    DocumentFailure::new(
                        "discover",
                        format!(
                            "duplicate slug ({} already uses it)",
                            existing.source_path.display()
                        ),
                    ),
                ));
                continue;
            }

            tracing::debug!(slug, path = %relative.display(), "discovered document");
            by_slug.insert(
                slug.clone(),
                ContentDocument {
                    slug,
                    source_path: relative,
                    front_matter: parsed.front_matter,
                    raw_markdown: parsed.content,
                },
            );
        }

        discovery.documents = by_slug.into_values().collect();
        Ok(discovery)
    }

    /// Recursively collect file paths relative to the content root.
    fn walk_directory(
        &self,
        dir: &Path,
        relative_path: &Path,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| SourceError::ReadEntry {
                path: dir.to_path_buf(),
                source: e,
            })?;

            let path = entry.path();
            let file_name = entry.file_name();

            // Skip hidden files and directories
            if file_name.to_string_lossy().starts_with('.') {
                continue;
            }

            let item_relative_path = relative_path.join(&file_name);
            if path.is_dir() {
                self.walk_directory(&path, &item_relative_path, files)?;
            } else if path.is_file() {
                files.push(item_relative_path);
            }
        }

        Ok(())
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}
