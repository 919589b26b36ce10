//! Configuration loading and types for longform.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Layered loading from defaults, `longform.yaml` and the environment (`load`)

mod load;
mod types;

use std::path::PathBuf;

// Re-export all types for convenient access
pub use types::{
    BuildConfig, CalloutDef, Config, MarkdownConfig, OnError, PrefillFormat, SiteConfig,
    SuggestionsConfig, ThemeConfig,
};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "longform.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("config path is not valid UTF-8: {0}")]
    EncodePath(PathBuf),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("{0}")]
    Validation(String),
}
