//! Package manifest reading.
//!
//! Flattens a package's option manifests into the list of game paths it
//! overwrites. A manifest that fails to parse is logged and skipped; it never
//! aborts the rest of the package.

mod types;

pub use types::{DefaultOption, GroupOption, GroupType, ModMeta, OptionGroup};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::paths;

/// File name of the package metadata.
pub const META_FILE: &str = "meta.json";

/// File name of the default option manifest.
pub const DEFAULT_OPTION_FILE: &str = "default_mod.json";

/// Extensions of 3-D model files.
pub const MODEL_EXTENSIONS: &[&str] = &["mdl"];

/// Extensions of texture and material files.
pub const TEXTURE_EXTENSIONS: &[&str] = &["tex", "atex", "mtrl", "dds", "png"];

/// Kind of manifest found in a package directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Default,
    Group,
}

/// Game paths extracted from one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPaths {
    /// Normalized, de-duplicated, sorted game paths.
    pub paths: Vec<String>,
    /// Manifests that parsed successfully.
    pub manifests_read: usize,
    /// Manifests that were skipped because they failed to parse.
    pub manifests_failed: usize,
}

impl ExtractedPaths {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Model-only / texture-only flags for these paths.
    pub fn content_flags(&self) -> ContentFlags {
        ContentFlags::from_paths(&self.paths)
    }
}

/// What kind of files a package contains.
///
/// The two flags are mutually exclusive; both are false when the package has
/// both kinds of files or neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFlags {
    pub model_only: bool,
    pub texture_only: bool,
}

impl ContentFlags {
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        if paths.is_empty() {
            return Self::default();
        }
        let model_only = paths.iter().all(|p| is_model_path(p.as_ref()));
        let texture_only = paths.iter().all(|p| is_texture_path(p.as_ref()));
        Self {
            model_only,
            texture_only,
        }
    }
}

/// Returns true if the path has a 3-D model extension.
pub fn is_model_path(path: &str) -> bool {
    paths::extension(path)
        .map(|ext| MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}

/// Returns true if the path has a texture or material extension.
pub fn is_texture_path(path: &str) -> bool {
    paths::extension(path)
        .map(|ext| TEXTURE_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}

/// Classify a file name as a manifest, if it is one.
pub fn manifest_kind(file_name: &str) -> Option<ManifestKind> {
    let lower = file_name.to_lowercase();
    if lower == DEFAULT_OPTION_FILE {
        return Some(ManifestKind::Default);
    }
    if lower.starts_with("group_") && lower.ends_with(".json") {
        return Some(ManifestKind::Group);
    }
    None
}

/// List the manifests directly inside a package directory, default first.
pub fn find_manifests(package_dir: &Path) -> Vec<(ManifestKind, PathBuf)> {
    let mut found: Vec<(ManifestKind, PathBuf)> = WalkDir::new(package_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            manifest_kind(&name).map(|kind| (kind, entry.path().to_path_buf()))
        })
        .collect();

    found.sort_by(|(a_kind, a_path), (b_kind, b_path)| {
        let a_rank = matches!(a_kind, ManifestKind::Group) as u8;
        let b_rank = matches!(b_kind, ManifestKind::Group) as u8;
        a_rank.cmp(&b_rank).then_with(|| a_path.cmp(b_path))
    });
    found
}

/// Load the default option manifest.
pub fn load_default_option(path: &Path) -> Result<DefaultOption> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Load an option group manifest.
pub fn load_option_group(path: &Path) -> Result<OptionGroup> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Read `meta.json` from a package directory, if present and valid.
pub fn read_meta(package_dir: &Path) -> Option<ModMeta> {
    let path = package_dir.join(META_FILE);
    if !path.is_file() {
        return None;
    }
    let content = match std::fs::read(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_slice::<ModMeta>(&content) {
        Ok(meta) => Some(meta),
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Read every manifest in a package directory and collect its game paths.
///
/// Returns an empty result if the directory is missing or has no manifests.
pub fn extract_game_paths(package_dir: &Path) -> ExtractedPaths {
    let mut result = ExtractedPaths::default();
    if !package_dir.is_dir() {
        debug!("Package directory missing: {}", package_dir.display());
        return result;
    }

    let mut collected: BTreeSet<String> = BTreeSet::new();

    for (kind, path) in find_manifests(package_dir) {
        let paths: Result<Vec<String>> = match kind {
            ManifestKind::Default => load_default_option(&path)
                .map(|option| option.game_paths().map(paths::normalize_game_path).collect()),
            ManifestKind::Group => load_option_group(&path).map(|group| {
                group
                    .options
                    .iter()
                    .flat_map(|option| option.game_paths())
                    .map(paths::normalize_game_path)
                    .collect()
            }),
        };

        match paths {
            Ok(paths) => {
                result.manifests_read += 1;
                collected.extend(paths.into_iter().filter(|p| !p.is_empty()));
            }
            Err(e) => {
                result.manifests_failed += 1;
                warn!("Skipping manifest: {:#}", e);
            }
        }
    }

    result.paths = collected.into_iter().collect();
    debug!(
        "Extracted {} game paths from {} ({} manifests, {} failed)",
        result.paths.len(),
        package_dir.display(),
        result.manifests_read,
        result.manifests_failed
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_manifest_kind() {
        assert_eq!(manifest_kind("default_mod.json"), Some(ManifestKind::Default));
        assert_eq!(manifest_kind("Default_Mod.json"), Some(ManifestKind::Default));
        assert_eq!(manifest_kind("group_001_color.json"), Some(ManifestKind::Group));
        assert_eq!(manifest_kind("meta.json"), None);
        assert_eq!(manifest_kind("group_001_color.txt"), None);
    }

    #[test]
    fn test_extract_flattens_and_dedups() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "default_mod.json",
            r#"{"Files": {"Chara\\Human\\C0101\\obj\\hair\\h0001\\model\\c0101h0001_hir.mdl": "a.mdl"}}"#,
        );
        write(
            tmp.path(),
            "group_001_color.json",
            r#"{
                "Name": "Color",
                "Type": 0,
                "Options": [
                    {"Name": "Red", "Files": {"chara/human/c0101/obj/hair/h0001/texture/--c0101h0001_hir_n.tex": "red.tex"}},
                    {"Name": "Blue", "Files": {
                        "chara/human/c0101/obj/hair/h0001/texture/--c0101h0001_hir_n.tex": "blue.tex",
                        "chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl": "b.mdl"
                    }}
                ]
            }"#,
        );

        let extracted = extract_game_paths(tmp.path());
        assert_eq!(extracted.manifests_read, 2);
        assert_eq!(extracted.manifests_failed, 0);
        assert_eq!(
            extracted.paths,
            vec![
                "chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl".to_string(),
                "chara/human/c0101/obj/hair/h0001/texture/--c0101h0001_hir_n.tex".to_string(),
            ]
        );
    }

    #[test]
    fn test_malformed_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "group_001_broken.json", "{ not json");
        write(
            tmp.path(),
            "default_mod.json",
            r#"{"Files": {"chara/equipment/e0100/model/c0101e0100_top.mdl": "top.mdl"}}"#,
        );

        let extracted = extract_game_paths(tmp.path());
        assert_eq!(extracted.manifests_read, 1);
        assert_eq!(extracted.manifests_failed, 1);
        assert_eq!(extracted.paths.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let extracted = extract_game_paths(&tmp.path().join("nope"));
        assert!(extracted.is_empty());
        assert_eq!(extracted.manifests_read, 0);
    }

    #[test]
    fn test_content_flags() {
        let models = vec!["a/b.mdl", "c/d.mdl"];
        let flags = ContentFlags::from_paths(&models);
        assert!(flags.model_only);
        assert!(!flags.texture_only);

        let textures = vec!["a/b.tex", "c/d.mtrl"];
        let flags = ContentFlags::from_paths(&textures);
        assert!(!flags.model_only);
        assert!(flags.texture_only);

        let mixed = vec!["a/b.mdl", "c/d.tex"];
        assert_eq!(ContentFlags::from_paths(&mixed), ContentFlags::default());

        let none: Vec<&str> = Vec::new();
        assert_eq!(ContentFlags::from_paths(&none), ContentFlags::default());
    }

    #[test]
    fn test_read_meta() {
        let tmp = TempDir::new().unwrap();
        assert!(read_meta(tmp.path()).is_none());
        write(
            tmp.path(),
            "meta.json",
            r#"{"Name": "Jacket [Models Only]", "Description": "Requires Jacket Textures"}"#,
        );
        let meta = read_meta(tmp.path()).unwrap();
        assert_eq!(meta.name, "Jacket [Models Only]");
        assert_eq!(meta.description, "Requires Jacket Textures");
    }
}
