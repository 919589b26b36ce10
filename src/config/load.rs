//! Configuration loading from files and the environment.
//!
//! Layers, lowest precedence first: the serde defaults on the config types,
//! the YAML config file (optional unless given explicitly), then
//! `LONGFORM_*` environment variables with `__` separating nested keys.

use std::path::{Path, PathBuf};

use super::{Config, ConfigError, DEFAULT_CONFIG_FILE};

impl Config {
    /// Load the config from the command line argument, defaulting to `longform.yaml`.
    ///
    /// An explicitly named file must exist; the default file may be absent.
    /// Relative `content`, `output` and `theme.path` entries are resolved
    /// against the directory containing the config file.
    pub async fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let required = config_file.is_some();
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        if required && !config_file.exists() {
            return Err(ConfigError::NotFound(config_file));
        }

        Self::load_from_file(&config_file, environment())
    }

    /// Load the config from a file path, layering `env` on top.
    pub(crate) fn load_from_file(
        path: &Path,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let mut config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize::<Config>()?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.resolve_paths(&root);
        config.validate()?;

        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn resolve_paths(&mut self, root: &Path) {
        let resolve = |path: &Path| {
            if path.is_relative() {
                root.join(path)
            } else {
                path.to_path_buf()
            }
        };

        self.site.content = resolve(&self.site.content);
        self.site.output = resolve(&self.site.output);
        self.theme.path = self.theme.path.as_deref().map(resolve);
        self.site.base_path = normalize_base_path(&self.site.base_path);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::BTreeSet::new();
        for def in &self.markdown.callouts {
            if def.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "callout definitions must have a non-empty name".to_string(),
                ));
            }
            for marker in std::iter::once(&def.name).chain(def.aliases.iter()) {
                if !seen.insert(marker.to_lowercase()) {
                    return Err(ConfigError::Validation(format!(
                        "callout marker '{marker}' is defined more than once"
                    )));
                }
            }
        }

        if self.site.content == self.site.output {
            return Err(ConfigError::Validation(
                "site.content and site.output must be different directories".to_string(),
            ));
        }

        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("LONGFORM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Ensure the base path starts and ends with `/`.
fn normalize_base_path(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
