pub mod action;
pub mod list;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use templar_core::{config::config_path_at, store::records_path_at, Config, ConfigError};
use templar_renderer::{templates_dir_at, Renderer};

/// Global flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub notify: bool,
}

impl Invocation {
    pub fn home(&self) -> Result<PathBuf> {
        dirs::home_dir().context("could not determine home directory")
    }

    /// Load and validate the configuration. Missing or invalid config is fatal.
    pub fn load_config(&self, home: &Path) -> Result<Config> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| config_path_at(home));
        Config::load_from(&path).with_context(|| {
            format!(
                "failed to load configuration from {} (create it or pass --config)",
                path.display()
            )
        })
    }

    /// Renderer honouring `--templates`, else `<home>/.templar/templates`.
    pub fn renderer(&self, home: &Path) -> Result<Renderer> {
        let dir = self
            .templates
            .clone()
            .unwrap_or_else(|| templates_dir_at(home));
        Renderer::with_template_dir(&dir)
            .with_context(|| format!("failed to load templates from {}", dir.display()))
    }

    /// Record store location for read-only commands.
    ///
    /// Without a config file the default store path is used.
    pub fn store_path(&self, home: &Path) -> Result<PathBuf> {
        if self.config.is_some() {
            return Ok(self.load_config(home)?.store_path(home));
        }
        match Config::load_at(home) {
            Ok(config) => Ok(config.store_path(home)),
            Err(ConfigError::NotFound { .. }) => Ok(records_path_at(home)),
            Err(e) => Err(e).context("failed to load configuration"),
        }
    }
}
