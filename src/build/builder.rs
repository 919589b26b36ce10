use std::path::{Path, PathBuf};

use crate::config::{Config, OnError};
use crate::markdown::{MarkdownError, TransformPipeline, parser_options};

use super::document::{DocumentFailure, StaticFile};
use super::nav::build_navigation;
use super::paths::{page_url, static_output_path};
use super::pipeline::{Pipeline, PipelineContext, PipelineError, ProcessingDocument};
use super::render::{RenderError, Renderer, SiteContext};
use super::source::{ContentSource, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("markdown configuration error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("output directory {0} contains the content directory")]
    OutputContainsContent(PathBuf),

    #[error("invalid output directory: {0}")]
    InvalidOutputDir(PathBuf),

    #[error("document '{slug}' failed in stage '{stage}': {reason}")]
    DocumentFailed {
        slug: String,
        stage: String,
        reason: String,
    },
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Pages written with metadata
    pub pages: usize,
    pub static_files: usize,
    /// Every document that failed, with the stage and reason
    pub failures: Vec<(String, DocumentFailure)>,
}

pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the site on the blocking thread pool.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || build_site(&config)).await?
    }
}

/// Build the whole site.
///
/// 1. Discover content -> documents and static files
/// 2. Load renderer (templates) and build navigation
/// 3. Copy static files and run the document pipeline (render, template,
///    write, finalize) into a fresh staging directory
/// 4. Replace the output directory with the staging directory
///
/// Nothing from an earlier build survives, so a page that now fails is
/// gone (or a placeholder) rather than stale. A build that aborts leaves
/// the previous output untouched.
///
/// Output depends only on the content and configuration: documents are
/// processed in slug order and nothing time- or host-dependent is written.
pub fn build_site(config: &Config) -> Result<BuildResult, BuildError> {
    // Reject bad parser options once instead of failing every document.
    parser_options(&config.markdown)?;

    let source = ContentSource::open(&config.site.content)?;
    let output_dir = &config.site.output;
    check_output_dir(source.root(), output_dir)?;

    let discovery = source.discover()?;
    tracing::info!(
        content = %source.root().display(),
        documents = discovery.documents.len(),
        static_files = discovery.static_files.len(),
        "discovered content"
    );

    let mut failures = Vec::new();
    for (slug, failure) in discovery.failures {
        tracing::warn!(
            slug,
            stage = %failure.stage,
            reason = %failure.reason,
            "document skipped"
        );
        if config.build.on_error == OnError::Fail {
            return Err(BuildError::DocumentFailed {
                slug,
                stage: failure.stage,
                reason: failure.reason,
            });
        }
        failures.push((slug, failure));
    }

    let renderer = Renderer::for_theme(config.theme.path.as_deref())?;
    let base_path = &config.site.base_path;
    let nav = build_navigation(&discovery.documents, base_path);
    let site = SiteContext {
        name: config.site.name.clone(),
        url: config.site.url.clone(),
        base_path: base_path.clone(),
    };

    let static_files = discovery.static_files.len();
    let mut docs: Vec<ProcessingDocument> = discovery
        .documents
        .into_iter()
        .map(|doc| {
            let url = page_url(base_path, &doc.slug);
            ProcessingDocument::new(doc, url)
        })
        .collect();

    let transforms = TransformPipeline::from_config(&config.markdown);
    let staging = staging_dir(output_dir)?;
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let written = copy_static_files(&discovery.static_files, source.root(), &staging)
        .and_then(|()| {
            let ctx = PipelineContext::new(&staging, config, &site, &nav, &transforms, &renderer);
            run_pipeline(&mut docs, ctx)
        });
    let pages = match written {
        Ok(pages) => pages,
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                tracing::warn!(
                    path = %staging.display(),
                    error = %cleanup,
                    "could not remove staging directory"
                );
            }
            return Err(e);
        }
    };
    replace_dir(&staging, output_dir)?;

    failures.extend(
        docs.into_iter()
            .filter_map(|doc| doc.failure.map(|failure| (doc.doc.slug, failure))),
    );
    failures.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::info!(
        pages,
        failed = failures.len(),
        output = %output_dir.display(),
        "build finished"
    );

    Ok(BuildResult {
        output_dir: output_dir.clone(),
        pages,
        static_files,
        failures,
    })
}

/// Run the default pipeline, returning the number of pages written.
fn run_pipeline(
    docs: &mut [ProcessingDocument],
    mut ctx: PipelineContext<'_>,
) -> Result<usize, BuildError> {
    Pipeline::default_pipeline().run(docs, &mut ctx)?;
    Ok(ctx.pages.len())
}

/// The output directory is replaced wholesale, so it must not hold the content.
fn check_output_dir(content_root: &Path, output_dir: &Path) -> Result<(), BuildError> {
    let content = content_root
        .canonicalize()
        .unwrap_or_else(|_| content_root.to_path_buf());
    let output = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());

    if content.starts_with(&output) {
        return Err(BuildError::OutputContainsContent(output_dir.to_path_buf()));
    }
    Ok(())
}

/// Sibling of the output directory that a build is written into.
fn staging_dir(output_dir: &Path) -> Result<PathBuf, BuildError> {
    let name = output_dir
        .file_name()
        .ok_or_else(|| BuildError::InvalidOutputDir(output_dir.to_path_buf()))?;
    let mut staging = std::ffi::OsString::from(".");
    staging.push(name);
    staging.push(".staging");
    Ok(output_dir.with_file_name(staging))
}

/// Move the finished build into place, removing the previous output.
fn replace_dir(staging: &Path, output_dir: &Path) -> Result<(), BuildError> {
    if output_dir.exists() {
        std::fs::remove_dir_all(output_dir)?;
    }
    std::fs::rename(staging, output_dir)?;
    Ok(())
}

fn copy_static_files(
    files: &[StaticFile],
    content_root: &Path,
    output_dir: &Path,
) -> Result<(), BuildError> {
    for file in files {
        let output_path = static_output_path(&file.source_path, output_dir);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(content_root.join(&file.source_path), &output_path)?;
    }
    Ok(())
}
