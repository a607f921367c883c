//! Package identity shared by the stores, the selection, and the loader.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Identifies one mod package.
///
/// Equality and hashing use the directory id only; the display name is
/// carried for matching heuristics and for the storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub directory_id: String,
    pub display_name: String,
}

impl PackageIdentity {
    pub fn new(directory_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            directory_id: directory_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Key used by the override and cache tables: `name|directory`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}|{}",
            self.display_name.trim().to_lowercase(),
            self.directory_id
        )
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.directory_id == other.directory_id
    }
}

impl Eq for PackageIdentity {}

impl Hash for PackageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.directory_id.hash(state);
    }
}

impl std::fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.display_name == self.directory_id {
            write!(f, "{}", self.display_name)
        } else {
            write!(f, "{} ({})", self.display_name, self.directory_id)
        }
    }
}
