//! In-memory provider.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{ModProvider, ModSettings, ProviderError};
use crate::identity::PackageIdentity;

/// Provider holding its inventory in memory.
///
/// Package manifests are still read from `mods_root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    root: Option<PathBuf>,
    packages: Vec<PackageIdentity>,
    collections: HashMap<String, HashMap<String, ModSettings>>,
    affecting: HashMap<String, HashSet<String>>,
    changed_items: HashMap<String, Vec<String>>,
    available: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// A provider that reports itself unavailable on every call.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn add_package(&mut self, identity: PackageIdentity) -> &mut Self {
        self.packages.push(identity);
        self
    }

    /// Create the collection if needed.
    pub fn add_collection(&mut self, collection_id: &str) -> &mut Self {
        self.collections.entry(collection_id.to_string()).or_default();
        self.affecting.entry(collection_id.to_string()).or_default();
        self
    }

    pub fn set_settings(&mut self, collection_id: &str, directory_id: &str, settings: ModSettings) -> &mut Self {
        self.collections
            .entry(collection_id.to_string())
            .or_default()
            .insert(directory_id.to_string(), settings);
        self
    }

    pub fn set_affecting(&mut self, collection_id: &str, directory_id: &str) -> &mut Self {
        self.affecting
            .entry(collection_id.to_string())
            .or_default()
            .insert(directory_id.to_string());
        self
    }

    pub fn set_changed_items(&mut self, directory_id: &str, labels: Vec<String>) -> &mut Self {
        self.changed_items.insert(directory_id.to_string(), labels);
        self
    }

    fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.available {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("provider not connected".to_string()))
        }
    }
}

impl ModProvider for MemoryProvider {
    fn mods_root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn list_packages(&self) -> Result<Vec<PackageIdentity>, ProviderError> {
        self.ensure_available()?;
        Ok(self.packages.clone())
    }

    fn collection_settings(
        &self,
        collection_id: &str,
    ) -> Result<HashMap<String, ModSettings>, ProviderError> {
        self.ensure_available()?;
        self.collections
            .get(collection_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownCollection(collection_id.to_string()))
    }

    fn currently_affecting(&self, collection_id: &str) -> Result<HashSet<String>, ProviderError> {
        self.ensure_available()?;
        if !self.collections.contains_key(collection_id) {
            return Err(ProviderError::UnknownCollection(collection_id.to_string()));
        }
        Ok(self.affecting.get(collection_id).cloned().unwrap_or_default())
    }

    fn changed_item_labels(&self, directory_id: &str) -> Result<Vec<String>, ProviderError> {
        self.ensure_available()?;
        Ok(self.changed_items.get(directory_id).cloned().unwrap_or_default())
    }
}
