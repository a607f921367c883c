//! Provider backed by a mods root directory.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{ModProvider, ModSettings, ProviderError, DEFAULT_COLLECTION};
use crate::identity::PackageIdentity;
use crate::manifest;

/// Collection state exported by the mod manager.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CollectionFile {
    #[serde(default)]
    pub name: String,

    /// Directory id -> settings.
    #[serde(default)]
    pub settings: HashMap<String, ModSettings>,

    /// Directory ids currently affecting the collection.
    #[serde(default)]
    pub affecting: Vec<String>,

    /// Directory id -> changed-item labels.
    #[serde(rename = "changedItems", default)]
    pub changed_items: HashMap<String, Vec<String>>,
}

/// Reads packages from `<root>/<directory_id>/` and collection state from an
/// optional JSON file.
///
/// Without a collection file only [`DEFAULT_COLLECTION`] exists, with every
/// package disabled.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
    collection_file: Option<PathBuf>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            collection_file: None,
        }
    }

    pub fn with_collection_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.collection_file = Some(path.into());
        self
    }

    fn ensure_root(&self) -> Result<(), ProviderError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable(format!(
                "mods root not found: {}",
                self.root.display()
            )))
        }
    }

    fn load_collection(&self) -> Result<Option<CollectionFile>, ProviderError> {
        let Some(path) = &self.collection_file else {
            return Ok(None);
        };
        let content = std::fs::read(path)?;
        let collection: CollectionFile =
            serde_json::from_slice(&content).map_err(|e| ProviderError::InvalidCollection {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Some(collection))
    }

    /// Load the collection named `collection_id`; `None` means the empty
    /// default collection.
    fn collection(&self, collection_id: &str) -> Result<Option<CollectionFile>, ProviderError> {
        self.ensure_root()?;
        match self.load_collection()? {
            Some(collection) => {
                let matches = collection.name.eq_ignore_ascii_case(collection_id)
                    || (collection.name.is_empty()
                        && collection_id.eq_ignore_ascii_case(DEFAULT_COLLECTION));
                if matches {
                    Ok(Some(collection))
                } else {
                    Err(ProviderError::UnknownCollection(collection_id.to_string()))
                }
            }
            None if collection_id.eq_ignore_ascii_case(DEFAULT_COLLECTION) => Ok(None),
            None => Err(ProviderError::UnknownCollection(collection_id.to_string())),
        }
    }
}

impl ModProvider for DirectoryProvider {
    fn mods_root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn list_packages(&self) -> Result<Vec<PackageIdentity>, ProviderError> {
        self.ensure_root()?;

        let mut packages = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let directory_id = entry.file_name().to_string_lossy().to_string();
            if directory_id.starts_with('.') {
                continue;
            }
            let display_name = manifest::read_meta(entry.path())
                .map(|meta| meta.name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| directory_id.clone());

            packages.push(PackageIdentity::new(directory_id, display_name));
        }

        packages.sort_by(|a, b| a.directory_id.cmp(&b.directory_id));
        debug!("Found {} packages in {}", packages.len(), self.root.display());
        Ok(packages)
    }

    fn collection_settings(
        &self,
        collection_id: &str,
    ) -> Result<HashMap<String, ModSettings>, ProviderError> {
        Ok(self
            .collection(collection_id)?
            .map(|c| c.settings)
            .unwrap_or_default())
    }

    fn currently_affecting(&self, collection_id: &str) -> Result<HashSet<String>, ProviderError> {
        Ok(self
            .collection(collection_id)?
            .map(|c| c.affecting.into_iter().collect())
            .unwrap_or_default())
    }

    fn changed_item_labels(&self, directory_id: &str) -> Result<Vec<String>, ProviderError> {
        self.ensure_root()?;
        Ok(self
            .load_collection()?
            .and_then(|mut c| c.changed_items.remove(directory_id))
            .unwrap_or_default())
    }
}
