mod builder;
mod document;
mod nav;
mod paths;
pub mod pipeline;
mod prefill;
mod render;
pub mod source;

pub use builder::{BuildError, BuildResult, Builder, build_site};
pub use document::{ContentDocument, DocumentFailure, FrontMatter, StaticFile, parse_front_matter};
pub use prefill::{PageMetadata, RenderResult, SuggestionPrefill, content_hash};
pub use render::{NavLink, NavSection, PageContext, RenderError, Renderer, SiteContext};
