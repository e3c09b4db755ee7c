//! Run configuration.
//!
//! Settings come from an optional TOML config file layered under CLI flags.
//! Only the fields that influence the produced text participate in the cache
//! key (see [`crate::cache`]).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default maximum character budget per chunk.
pub const DEFAULT_CHAR_LIMIT: usize = 2000;

/// Configuration for a flattening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool size. 0 selects the rayon default (one per core).
    pub threads: usize,
    /// Maximum character budget per chunk.
    pub char_limit: usize,
    /// Wrap fragments (no `\begin{document}`) in a minimal document shell.
    pub make_complete: bool,
    /// Keep `\section{...}`-style wrappers in the output instead of
    /// flattening them away.
    pub keep_command_wrappers: bool,
    /// Skip the run cache entirely.
    pub no_cache: bool,
    /// Emit `text_old` / `text_new` / `objs` side files for inspection.
    pub debug: bool,
    /// Override for the cache directory. None uses the platform cache dir.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            char_limit: DEFAULT_CHAR_LIMIT,
            make_complete: true,
            keep_command_wrappers: false,
            no_cache: false,
            debug: false,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Path of the user config file.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("flattex").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(&path, toml_str)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
