//! Ordered event-stream transforms.
//!
//! Each [`Transform`] is a pure function over an [`EventStream`]. The
//! [`TransformPipeline`] folds the stream through its stages in order and
//! re-checks nesting after every one; a stage that breaks nesting is
//! discarded for that document and its input passes through.

use super::callouts::CalloutStage;
use super::code_blocks::CodeBlockStage;
use super::math::MathStage;
use super::modules::ModuleStage;
use super::stream::{EventStream, check_balanced};
use super::tables::TableStage;
use crate::config::MarkdownConfig;

/// A stage in the transform pipeline.
///
/// Stages must not perform I/O and must leave events they do not recognize
/// exactly as they found them.
pub trait Transform: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Rewrite the stream.
    fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a>;
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("no transform stage named '{0}'")]
    UnknownStage(String),
}

pub struct TransformPipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline for a markdown configuration.
    ///
    /// Stages: callouts → tables → modules → math → code-blocks
    pub fn from_config(config: &MarkdownConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(CalloutStage::new(config.callouts.clone()));
        pipeline.add_stage(TableStage);
        pipeline.add_stage(ModuleStage::new(config.modules.clone()));
        pipeline.add_stage(MathStage);
        pipeline.add_stage(CodeBlockStage::new(&config.highlight_theme));
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<T: Transform + 'static>(&mut self, stage: T) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    pub fn insert_before<T: Transform + 'static>(
        &mut self,
        name: &str,
        stage: T,
    ) -> Result<&mut Self, TransformError> {
        let pos = self.position(name)?;
        self.stages.insert(pos, Box::new(stage));
        Ok(self)
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<T: Transform + 'static>(
        &mut self,
        name: &str,
        stage: T,
    ) -> Result<&mut Self, TransformError> {
        let pos = self.position(name)?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    fn position(&self, name: &str) -> Result<usize, TransformError> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| TransformError::UnknownStage(name.to_string()))
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over the stream.
    pub fn run<'a>(&self, mut events: EventStream<'a>) -> EventStream<'a> {
        for stage in &self.stages {
            let output = stage.apply(events.clone());
            match check_balanced(&output) {
                Ok(()) => events = output,
                Err(e) => {
                    tracing::warn!(
                        stage = stage.name(),
                        reason = %e,
                        "transform produced unbalanced output, passing input through"
                    );
                }
            }
        }
        events
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::stream::{Container, StreamEvent, from_parser};
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    /// Appends a close with no matching open.
    struct Dangling;

    impl Transform for Dangling {
        fn name(&self) -> &'static str {
            "dangling"
        }

        fn apply<'a>(&self, mut events: EventStream<'a>) -> EventStream<'a> {
            events.push(StreamEvent::Close(Container::TableScroll));
            events
        }
    }

    struct Identity;

    impl Transform for Identity {
        fn name(&self) -> &'static str {
            "identity"
        }

        fn apply<'a>(&self, events: EventStream<'a>) -> EventStream<'a> {
            events
        }
    }

    #[test]
    fn test_default_stage_order() {
        let pipeline = TransformPipeline::from_config(&MarkdownConfig::default());
        assert_eq!(
            pipeline.stage_names(),
            vec!["callouts", "tables", "modules", "math", "code-blocks"]
        );
    }

    #[test]
    fn test_unbalanced_stage_is_discarded() {
        let events = from_parser(Parser::new("# Title\n\nBody.\n"));
        let mut pipeline = TransformPipeline::new();
        pipeline.add_stage(Dangling);
        assert_eq!(pipeline.run(events.clone()), events);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut pipeline = TransformPipeline::from_config(&MarkdownConfig::default());
        pipeline.insert_before("math", Identity).unwrap();
        pipeline.insert_after("code-blocks", Dangling).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "callouts",
                "tables",
                "modules",
                "identity",
                "math",
                "code-blocks",
                "dangling"
            ]
        );
    }

    #[test]
    fn test_insert_unknown_stage() {
        let mut pipeline = TransformPipeline::new();
        let result = pipeline.insert_after("nope", Identity).map(|_| ());
        assert_eq!(
            result,
            Err(TransformError::UnknownStage("nope".to_string()))
        );
    }
}
