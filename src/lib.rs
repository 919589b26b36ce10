//! Static site generator for long-form statistics tutorials.
//!
//! [`markdown`] turns one document into an HTML fragment and outline;
//! [`build`] drives it over a content directory and writes the site.

pub mod build;
pub mod config;
pub mod markdown;
mod util;
