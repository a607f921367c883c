//! Type definitions for the on-disk mod manifest format.
//!
//! A package directory holds a `meta.json` describing the mod, an optional
//! `default_mod.json` with the always-applied file redirections, and zero or
//! more `group_NNN_<name>.json` files, each a list of named options with
//! their own redirections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Package metadata (`meta.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModMeta {
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,

    #[serde(rename = "Author", alias = "author", default)]
    pub author: String,

    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,

    #[serde(rename = "Version", alias = "version", default)]
    pub version: String,

    #[serde(rename = "ModTags", alias = "tags", default)]
    pub tags: Vec<String>,
}

/// The always-on option (`default_mod.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefaultOption {
    /// Game path -> file inside the package.
    #[serde(rename = "Files", default)]
    pub files: BTreeMap<String, serde_json::Value>,

    /// Game path -> other game path.
    #[serde(rename = "FileSwaps", default)]
    pub file_swaps: BTreeMap<String, serde_json::Value>,
}

impl DefaultOption {
    /// Game paths this option writes to.
    pub fn game_paths(&self) -> impl Iterator<Item = &str> {
        self.files
            .keys()
            .chain(self.file_swaps.keys())
            .map(|s| s.as_str())
    }
}

/// How many options of a group may be enabled at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GroupType {
    /// Exactly one option (tag 0).
    #[default]
    Single,
    /// Any subset of options (tag 1).
    Multi,
    /// Any subset, with combined file lists (tag 2).
    Combining,
}

impl GroupType {
    pub fn is_multi_select(&self) -> bool {
        !matches!(self, GroupType::Single)
    }
}

/// Group type as written on disk: either the numeric tag or its name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupType {
    Tag(u8),
    Name(String),
}

impl<'de> Deserialize<'de> for GroupType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawGroupType::deserialize(deserializer)?;
        let group_type = match raw {
            RawGroupType::Tag(0) => GroupType::Single,
            RawGroupType::Tag(1) => GroupType::Multi,
            RawGroupType::Tag(2) => GroupType::Combining,
            RawGroupType::Tag(other) => {
                return Err(serde::de::Error::custom(format!("unknown group type tag {other}")))
            }
            RawGroupType::Name(name) => match name.to_ascii_lowercase().as_str() {
                "single" => GroupType::Single,
                "multi" => GroupType::Multi,
                "combining" => GroupType::Combining,
                _ => {
                    return Err(serde::de::Error::custom(format!("unknown group type {name}")))
                }
            },
        };
        Ok(group_type)
    }
}

/// One named option inside a group.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupOption {
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Files", default)]
    pub files: BTreeMap<String, serde_json::Value>,

    #[serde(rename = "FileSwaps", default)]
    pub file_swaps: BTreeMap<String, serde_json::Value>,
}

impl GroupOption {
    /// Game paths this option writes to.
    pub fn game_paths(&self) -> impl Iterator<Item = &str> {
        self.files
            .keys()
            .chain(self.file_swaps.keys())
            .map(|s| s.as_str())
    }
}

/// An option group (`group_*.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OptionGroup {
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Type", alias = "GroupType", default)]
    pub group_type: GroupType,

    #[serde(rename = "Options", default)]
    pub options: Vec<GroupOption>,
}
