//! Document types for pipeline processing.

use crate::build::document::{ContentDocument, DocumentFailure};
use crate::build::prefill::RenderResult;

/// A document being processed through the pipeline.
///
/// Wraps the immutable `ContentDocument` with state filled in by stages:
///
/// 1. After render: `result` holds the HTML fragment, outline and hash
/// 2. After template: `output_html` holds the full page
///
/// A stage that fails for this document sets `failure`; later stages skip
/// it, except that the template stage may still produce an error
/// placeholder page.
#[derive(Debug)]
pub struct ProcessingDocument {
    pub doc: ContentDocument,

    /// URL the page is served at
    pub page_url: String,

    pub result: Option<RenderResult>,

    /// Final HTML output after template rendering.
    pub output_html: Option<String>,

    pub failure: Option<DocumentFailure>,
}

impl ProcessingDocument {
    pub fn new(doc: ContentDocument, page_url: String) -> Self {
        Self {
            doc,
            page_url,
            result: None,
            output_html: None,
            failure: None,
        }
    }

    pub fn slug(&self) -> &str {
        &self.doc.slug
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Record a failure for this document. The first failure wins.
    pub fn fail(&mut self, stage: &str, reason: impl ToString) {
        if self.failure.is_none() {
            self.failure = Some(DocumentFailure::new(stage, reason));
        }
    }
}
