//! Mod provider adapters.
//!
//! The provider owns the mod inventory and per-collection state; this crate
//! only reads from it. Two adapters are included:
//! - [`DirectoryProvider`] reads a mods root on disk plus an optional
//!   collection file;
//! - [`MemoryProvider`] holds everything in memory.

mod directory;
mod memory;

pub use directory::{CollectionFile, DirectoryProvider};
pub use memory::MemoryProvider;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::identity::PackageIdentity;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "Default";

/// Per-collection state of one package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
}

/// Provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Mod provider unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid collection file {path}: {message}")]
    InvalidCollection { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read access to a mod inventory.
pub trait ModProvider: Send + Sync {
    /// Directory holding one subdirectory per package, if the provider has one.
    fn mods_root(&self) -> Option<&Path>;

    fn list_packages(&self) -> Result<Vec<PackageIdentity>, ProviderError>;

    /// Enabled/priority per directory id.
    fn collection_settings(
        &self,
        collection_id: &str,
    ) -> Result<HashMap<String, ModSettings>, ProviderError>;

    /// Directory ids currently affecting the collection.
    fn currently_affecting(&self, collection_id: &str) -> Result<HashSet<String>, ProviderError>;

    /// Human-readable names of the items a package changes.
    fn changed_item_labels(&self, directory_id: &str) -> Result<Vec<String>, ProviderError>;

    /// On-disk directory of a package.
    fn package_dir(&self, directory_id: &str) -> Option<PathBuf> {
        self.mods_root().map(|root| root.join(directory_id))
    }
}
