//! Build pipeline for document processing.
//!
//! The pipeline transforms documents through a series of stages:
//! 1. Render (markdown to an HTML fragment, outline and content hash)
//! 2. Template (page template wrapper, or an error placeholder)
//! 3. Write (page HTML and metadata to disk)
//!
//! Build-wide stages run after all documents are processed: the page
//! manifest and the highlight stylesheet.
//!
//! A stage records per-document failures on the document itself. After
//! every stage the pipeline reports new failures and, when the failure
//! policy is `fail`, stops.

mod context;
mod document;
mod error;
mod stages;

pub use context::{PageSummary, PipelineContext};
pub use document::ProcessingDocument;
pub use error::PipelineError;

use stages::{HighlightCssStage, ManifestStage, RenderStage, TemplateStage, WriteStage};

use crate::config::OnError;

/// A stage in the document processing pipeline.
///
/// Stages transform documents sequentially. Each stage receives all documents
/// and can modify them in place before passing to the next stage.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Process documents through this stage.
    ///
    /// Failures that concern a single document are recorded with
    /// [`ProcessingDocument::fail`]; an `Err` aborts the build.
    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// A stage that runs once after all documents are processed.
pub trait FinalizeStage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Run finalization after all documents are processed and written.
    fn finalize(&self, ctx: &PipelineContext) -> Result<(), PipelineError>;
}

/// The document processing pipeline.
///
/// The default pipeline includes: render → template → write, then the
/// manifest and highlight-css finalize stages.
pub struct Pipeline {
    /// Document processing stages (run for each document batch)
    stages: Vec<Box<dyn Stage>>,
    /// Build-wide stages (run once after all documents)
    finalize_stages: Vec<Box<dyn FinalizeStage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            finalize_stages: Vec::new(),
        }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(RenderStage);
        pipeline.add_stage(TemplateStage);
        pipeline.add_stage(WriteStage);
        pipeline.add_finalize_stage(ManifestStage);
        pipeline.add_finalize_stage(HighlightCssStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    pub fn insert_before<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos, Box::new(stage));
        Ok(self)
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    fn position(&self, name: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::stage(name, "not found in pipeline"))
    }

    /// Add a finalize stage (runs after all documents are processed).
    pub fn add_finalize_stage<S: FinalizeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.finalize_stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline on a set of documents.
    pub fn run(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), documents = docs.len(), "running stage");
            stage.process(docs, ctx)?;
            report_failures(docs, stage.name(), ctx.config.build.on_error)?;
        }

        for stage in &self.finalize_stages {
            tracing::debug!(stage = stage.name(), "running finalize stage");
            stage.finalize(ctx)?;
        }

        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

/// Log the failures a stage just recorded; under `fail`, abort on the first.
fn report_failures(
    docs: &[ProcessingDocument],
    stage: &str,
    on_error: OnError,
) -> Result<(), PipelineError> {
    for doc in docs {
        let Some(failure) = &doc.failure else {
            continue;
        };
        if failure.stage != stage {
            continue;
        }

        tracing::warn!(
            slug = doc.slug(),
            stage = %failure.stage,
            reason = %failure.reason,
            "document failed"
        );
        if on_error == OnError::Fail {
            return Err(PipelineError::DocumentFailed {
                slug: doc.slug().to_string(),
                stage: failure.stage.clone(),
                reason: failure.reason.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::{ContentDocument, FrontMatter};
    use crate::build::render::{Renderer, SiteContext};
    use crate::config::Config;
    use crate::markdown::TransformPipeline;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// Fails every document whose slug starts with "bad".
    struct FailBad;

    impl Stage for FailBad {
        fn name(&self) -> &'static str {
            "fail-bad"
        }

        fn process(
            &self,
            docs: &mut [ProcessingDocument],
            _ctx: &mut PipelineContext,
        ) -> Result<(), PipelineError> {
            for doc in docs.iter_mut().filter(|d| d.slug().starts_with("bad")) {
                doc.fail("fail-bad", "synthetic failure");
            }
            Ok(())
        }
    }

    fn docs(slugs: &[&str]) -> Vec<ProcessingDocument> {
        slugs
            .iter()
            .map(|slug| {
                ProcessingDocument::new(
                    ContentDocument {
                        slug: slug.to_string(),
                        source_path: PathBuf::from(format!("{slug}.md")),
                        front_matter: FrontMatter::default(),
                        raw_markdown: format!("# {slug}\n"),
                    },
                    format!("/{slug}/"),
                )
            })
            .collect()
    }

    fn run_with(
        pipeline: &Pipeline,
        docs: &mut [ProcessingDocument],
        config: &Config,
    ) -> Result<(), PipelineError> {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteContext {
            name: "Test".to_string(),
            url: None,
            base_path: "/".to_string(),
        };
        let transforms = TransformPipeline::from_config(&config.markdown);
        let renderer = Renderer::builtin().unwrap();
        let mut ctx = PipelineContext::new(dir.path(), config, &site, &[], &transforms, &renderer);
        pipeline.run(docs, &mut ctx)
    }

    #[test]
    fn test_default_stage_order() {
        assert_eq!(
            Pipeline::default_pipeline().stage_names(),
            vec!["render", "template", "write"]
        );
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut pipeline = Pipeline::default_pipeline();
        pipeline.insert_before("template", FailBad).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["render", "fail-bad", "template", "write"]
        );
        assert!(pipeline.insert_after("missing", FailBad).is_err());
    }

    #[test]
    fn test_skip_policy_continues() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(FailBad);
        let mut docs = docs(&["bad-one", "good"]);

        run_with(&pipeline, &mut docs, &Config::default()).unwrap();
        assert!(docs[0].is_failed());
        assert!(!docs[1].is_failed());
    }

    #[test]
    fn test_fail_policy_aborts() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(FailBad);
        let mut config = Config::default();
        config.build.on_error = OnError::Fail;
        let mut docs = docs(&["bad-one", "good"]);

        let err = run_with(&pipeline, &mut docs, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DocumentFailed { ref slug, ref stage, .. }
                if slug == "bad-one" && stage == "fail-bad"
        ));
    }
}
