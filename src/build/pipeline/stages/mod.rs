//! Default pipeline stages.
//!
//! The standard document processing pipeline consists of:
//!
//! 1. **RenderStage** - Run the markdown pipeline and hash the output
//! 2. **TemplateStage** - Wrap content in the page template
//! 3. **WriteStage** - Write page HTML and `meta.json` to the output directory
//!
//! Followed by the build-wide **ManifestStage** (`pages.json`) and
//! **HighlightCssStage** (`assets/highlight.css`).

mod assets;
mod manifest;
mod render;
mod template;
mod write;

pub use assets::HighlightCssStage;
pub use manifest::ManifestStage;
pub use render::RenderStage;
pub use template::TemplateStage;
pub use write::WriteStage;
