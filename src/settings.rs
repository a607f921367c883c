//! Settings management for modsift
//!
//! Stores user preferences in ~/.config/modsift/settings.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::loader::LoaderConfig;
use crate::provider::DEFAULT_COLLECTION;

/// Default number of packages per loader batch.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Mods root is not set")]
    MissingModsRoot,

    #[error("Mods root not found: {0}")]
    ModsRootNotFound(PathBuf),

    #[error("Collection file not found: {0}")]
    CollectionFileNotFound(PathBuf),

    #[error("Collection id must not be empty")]
    EmptyCollection,

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// User settings for modsift
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory with one subdirectory per package
    #[serde(default)]
    pub mods_root: String,

    /// Collection to read enabled/priority state from
    #[serde(default = "default_collection")]
    pub collection_id: String,

    /// Exported collection state (optional)
    #[serde(default)]
    pub collection_file: String,

    /// Override/cache database (empty = default location)
    #[serde(default)]
    pub database_path: String,

    /// Packages per loader batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Extra body-framework name tokens
    #[serde(default)]
    pub body_tokens: Vec<String>,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mods_root: String::new(),
            collection_id: default_collection(),
            collection_file: String::new(),
            database_path: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            body_tokens: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the config directory path (~/.config/modsift)
    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("modsift");

        Ok(config_dir)
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Default database location (~/.local/share/modsift/categories.db)
    pub fn default_database_path() -> Result<PathBuf> {
        Ok(dirs::data_local_dir()
            .context("Could not determine data directory")?
            .join("modsift")
            .join("categories.db"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path().and_then(|path| Self::load_from(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        let settings: Self =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    /// Save settings to a specific file, replacing it atomically
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        tmp.write_all(content.as_bytes())
            .context("Failed to write settings")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Database path, falling back to the default location
    pub fn database_path(&self) -> Result<PathBuf> {
        if self.database_path.is_empty() {
            Self::default_database_path()
        } else {
            Ok(PathBuf::from(&self.database_path))
        }
    }

    pub fn collection_file(&self) -> Option<PathBuf> {
        (!self.collection_file.is_empty()).then(|| PathBuf::from(&self.collection_file))
    }

    /// Check the paths exist and the numbers make sense
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.mods_root.is_empty() {
            return Err(SettingsError::MissingModsRoot);
        }
        let root = PathBuf::from(&self.mods_root);
        if !root.is_dir() {
            return Err(SettingsError::ModsRootNotFound(root));
        }
        if let Some(file) = self.collection_file() {
            if !file.is_file() {
                return Err(SettingsError::CollectionFileNotFound(file));
            }
        }
        self.loader_config().validate()
    }

    /// Runtime loader configuration
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            collection_id: self.collection_id.clone(),
            batch_size: self.batch_size,
            body_tokens: self.body_tokens.clone(),
        }
    }
}
