//! The per-package result record.

use serde::{Deserialize, Serialize};

use crate::analysis::ConflictAnalysis;
use crate::category::Category;
use crate::dependency::Dependency;
use crate::identity::PackageIdentity;
use crate::manifest::ContentFlags;

/// One classified package.
///
/// Rebuilt on every load; only the override store and the category cache
/// outlive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModEntry {
    pub identity: PackageIdentity,
    /// Final category, override applied.
    pub category: Category,
    pub enabled: bool,
    pub priority: i32,
    /// Provider reports the package as currently affecting the collection.
    pub affecting: bool,
    pub flags: ContentFlags,
    /// `meta.json` description, used for declared dependencies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Present only while the entry is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ConflictAnalysis>,
}

impl ModEntry {
    pub fn new(identity: PackageIdentity, category: Category) -> Self {
        Self {
            identity,
            category,
            enabled: false,
            priority: 0,
            affecting: false,
            flags: ContentFlags::default(),
            description: String::new(),
            dependencies: Vec::new(),
            analysis: None,
        }
    }

    pub fn directory_id(&self) -> &str {
        &self.identity.directory_id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn has_only_model_files(&self) -> bool {
        self.flags.model_only
    }

    pub fn has_only_texture_files(&self) -> bool {
        self.flags.texture_only
    }
}

/// Display order: case-insensitive name, then directory id.
pub fn sort_entries(entries: &mut [ModEntry]) {
    entries.sort_by(|a, b| {
        a.display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase())
            .then_with(|| a.directory_id().cmp(b.directory_id()))
    });
}
