//! Caller-facing view of a finished load.
//!
//! Holds the entries, the shared selection, and the store. Every mutation
//! keeps the analysis of selected entries current and writes overrides
//! through to the store immediately.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::analysis;
use crate::category::Category;
use crate::classifier::Classifier;
use crate::dependency::DependencyDetector;
use crate::entry::ModEntry;
use crate::identity::PackageIdentity;
use crate::loader::{self, LoadResult, LoaderConfig};
use crate::provider::ModProvider;
use crate::selection::{SelectionState, SharedSelection};
use crate::store::CategoryStore;

pub struct Session {
    entries: Vec<ModEntry>,
    selection: SharedSelection,
    store: Arc<CategoryStore>,
    provider: Arc<dyn ModProvider>,
    classifier: Classifier,
}

impl Session {
    /// Wrap a completed load.
    ///
    /// `selection` should be the same shared state the load ran against; it
    /// is brought in line with the result's selection.
    pub fn new(
        result: LoadResult,
        selection: SharedSelection,
        store: Arc<CategoryStore>,
        provider: Arc<dyn ModProvider>,
        config: &LoaderConfig,
    ) -> Result<Self> {
        *selection.lock()? = result.selection;
        Ok(Self {
            entries: result.entries,
            selection,
            store,
            provider,
            classifier: Classifier::new().with_body_tokens(&config.body_tokens),
        })
    }

    pub fn entries(&self) -> &[ModEntry] {
        &self.entries
    }

    pub fn entry(&self, directory_id: &str) -> Option<&ModEntry> {
        self.entries.iter().find(|e| e.directory_id() == directory_id)
    }

    pub fn entries_in(&self, category: Category) -> impl Iterator<Item = &ModEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn is_selected(&self, directory_id: &str) -> Result<bool> {
        Ok(self.selection.lock()?.is_selected(directory_id))
    }

    fn index_of(&self, directory_id: &str) -> Result<usize> {
        match self.entries.iter().position(|e| e.directory_id() == directory_id) {
            Some(index) => Ok(index),
            None => bail!("Unknown package: {}", directory_id),
        }
    }

    /// Select a package. Returns the prerequisites that were auto-selected
    /// with it (only on its first selection).
    pub fn select(&mut self, directory_id: &str) -> Result<Vec<PackageIdentity>> {
        let index = self.index_of(directory_id)?;
        let mut auto_selected = Vec::new();
        {
            let mut selection = self.selection.lock()?;
            if selection.select(directory_id) {
                for required in analysis::unmet_resolvable(&self.entries[index], &selection) {
                    if self.entries.iter().any(|e| e.identity == required) {
                        selection.select(&required.directory_id);
                        auto_selected.push(required);
                    }
                }
            }
        }

        if !auto_selected.is_empty() {
            info!(
                "Selected {} with {} prerequisite(s)",
                self.entries[index].identity,
                auto_selected.len()
            );
        }
        self.refresh()?;
        Ok(auto_selected)
    }

    /// Deselect (and unpin) a package.
    pub fn deselect(&mut self, directory_id: &str) -> Result<()> {
        self.index_of(directory_id)?;
        self.selection.lock()?.deselect(directory_id);
        self.refresh()
    }

    /// Flip selection; returns the new state.
    pub fn toggle(&mut self, directory_id: &str) -> Result<bool> {
        if self.is_selected(directory_id)? {
            self.deselect(directory_id)?;
            Ok(false)
        } else {
            self.select(directory_id)?;
            Ok(true)
        }
    }

    /// Pin (and select) a package.
    pub fn pin(&mut self, directory_id: &str) -> Result<()> {
        self.index_of(directory_id)?;
        let newly_selected = !self.is_selected(directory_id)?;
        if newly_selected {
            self.select(directory_id)?;
        }
        self.selection.lock()?.pin(directory_id);
        self.refresh()
    }

    pub fn unpin(&mut self, directory_id: &str) -> Result<()> {
        self.index_of(directory_id)?;
        self.selection.lock()?.unpin(directory_id);
        Ok(())
    }

    /// Force a category; written through to the store.
    pub fn set_override(&mut self, directory_id: &str, category: Category) -> Result<()> {
        let index = self.index_of(directory_id)?;
        let entry = &self.entries[index];
        self.store
            .set_override(&entry.identity, category, entry.flags)?;
        info!("Override: {} -> {}", entry.identity, category);

        self.entries[index].category = category;
        self.redetect(index);
        self.refresh()
    }

    /// Drop an override and re-classify from the manifests. Returns the
    /// automatic category.
    pub fn clear_override(&mut self, directory_id: &str) -> Result<Category> {
        let index = self.index_of(directory_id)?;
        let identity = self.entries[index].identity.clone();
        self.store.clear_override(&identity)?;

        let fresh = loader::classify_fresh(self.provider.as_ref(), &self.classifier, &identity);
        if fresh.is_cacheable() {
            self.store.put_cached(&identity, fresh.category, fresh.flags)?;
        }
        debug!("Override cleared: {} -> {}", identity, fresh.category);

        let entry = &mut self.entries[index];
        entry.category = fresh.category;
        entry.flags = fresh.flags;
        self.redetect(index);
        self.refresh()?;
        Ok(fresh.category)
    }

    /// Hand the selection back to the caller.
    pub fn apply(&self) -> Result<SelectionState> {
        self.selection.snapshot()
    }

    fn redetect(&mut self, index: usize) {
        if !DependencyDetector::applies_to(&self.entries[index]) {
            self.entries[index].dependencies.clear();
            return;
        }
        if self.entries[index].description.is_empty() {
            self.entries[index].description =
                loader::read_description(self.provider.as_ref(), &self.entries[index].identity);
        }
        let detector = DependencyDetector::new(&self.entries, self.classifier.body_tokens());
        let dependencies = detector.detect(&self.entries[index]);
        self.entries[index].dependencies = dependencies;
    }

    fn refresh(&mut self) -> Result<()> {
        let selection = self.selection.snapshot()?;
        analysis::refresh_all(&mut self.entries, &selection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{BatchLoader, LoadOutcome};
    use crate::provider::MemoryProvider;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_package(root: &Path, dir: &str, paths: &[&str]) {
        let package = root.join(dir);
        fs::create_dir_all(&package).unwrap();
        let files: serde_json::Map<String, serde_json::Value> = paths
            .iter()
            .map(|p| (p.to_string(), serde_json::Value::String("x".to_string())))
            .collect();
        fs::write(
            package.join("default_mod.json"),
            serde_json::json!({ "Files": files }).to_string(),
        )
        .unwrap();
    }

    const BODY: &[&str] = &[
        "chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl",
        "chara/equipment/e0000/model/c0101e0000_dwn.mdl",
    ];

    async fn session(tmp: &TempDir, selection: SelectionState) -> Session {
        let root = tmp.path();
        write_package(root, "body-a", BODY);
        write_package(root, "body-c", BODY);
        write_package(root, "jacket-models", &["chara/equipment/e0100/model/c0101e0100_top.mdl"]);
        write_package(root, "jacket-textures", &["chara/equipment/e0100/texture/v01_c0101e0100_top_d.tex"]);
        write_package(root, "hair", &["chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl"]);

        let mut provider = MemoryProvider::new().with_root(root);
        provider
            .add_collection("Default")
            .add_package(PackageIdentity::new("body-a", "Body A"))
            .add_package(PackageIdentity::new("body-c", "Body C"))
            .add_package(PackageIdentity::new("jacket-models", "Jacket [Models Only]"))
            .add_package(PackageIdentity::new("jacket-textures", "Jacket Textures"))
            .add_package(PackageIdentity::new("hair", "Wavy Bob"));
        let provider: Arc<dyn ModProvider> = Arc::new(provider);
        let store = Arc::new(CategoryStore::in_memory().unwrap());
        let config = LoaderConfig::default();
        let shared = SharedSelection::new(selection);

        let loader = BatchLoader::new(Arc::clone(&provider), Arc::clone(&store), config.clone(), shared.clone());
        let result = match loader.run().await.unwrap() {
            LoadOutcome::Complete(result) => result,
            other => panic!("load did not complete: {:?}", other),
        };
        Session::new(result, shared, store, provider, &config).unwrap()
    }

    #[tokio::test]
    async fn test_body_conflict() {
        let tmp = TempDir::new().unwrap();
        let mut selection = SelectionState::new();
        selection.select("body-c");
        let mut session = session(&tmp, selection).await;

        session.select("body-a").unwrap();
        let analysis = session.entry("body-a").unwrap().analysis.clone().unwrap();
        assert!(analysis.has_conflicts);
        assert_eq!(analysis.conflicting, vec![PackageIdentity::new("body-c", "Body C")]);

        // The other side sees the conflict too.
        let other = session.entry("body-c").unwrap().analysis.clone().unwrap();
        assert!(other.has_conflicts);

        session.deselect("body-c").unwrap();
        assert!(session.entry("body-c").unwrap().analysis.is_none());
        assert!(!session.entry("body-a").unwrap().analysis.as_ref().unwrap().has_conflicts);
    }

    #[tokio::test]
    async fn test_first_selection_pulls_prerequisite() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, SelectionState::new()).await;

        let auto = session.select("jacket-models").unwrap();
        assert_eq!(auto, vec![PackageIdentity::new("jacket-textures", "Jacket Textures")]);
        assert!(session.is_selected("jacket-textures").unwrap());
        let analysis = session.entry("jacket-models").unwrap().analysis.clone().unwrap();
        assert!(!analysis.has_dependency);

        // Reversible, and not re-applied on an already selected entry.
        session.deselect("jacket-textures").unwrap();
        assert!(session.select("jacket-models").unwrap().is_empty());
        assert!(!session.is_selected("jacket-textures").unwrap());
        assert!(session.entry("jacket-models").unwrap().analysis.as_ref().unwrap().has_dependency);
    }

    #[tokio::test]
    async fn test_override_precedence_and_revert() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, SelectionState::new()).await;
        assert_eq!(session.entry("hair").unwrap().category, Category::Hair);

        session.set_override("hair", Category::EarsTails).unwrap();
        assert_eq!(session.entry("hair").unwrap().category, Category::EarsTails);
        assert_eq!(session.entries_in(Category::EarsTails).count(), 1);

        let reverted = session.clear_override("hair").unwrap();
        assert_eq!(reverted, Category::Hair);
        assert_eq!(session.entry("hair").unwrap().category, Category::Hair);
    }

    #[tokio::test]
    async fn test_override_changes_dependency_eligibility() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, SelectionState::new()).await;
        assert_eq!(session.entry("jacket-models").unwrap().dependencies.len(), 1);

        session.set_override("jacket-models", Category::Hair).unwrap();
        assert!(session.entry("jacket-models").unwrap().dependencies.is_empty());

        session.clear_override("jacket-models").unwrap();
        assert_eq!(session.entry("jacket-models").unwrap().dependencies.len(), 1);
    }

    #[tokio::test]
    async fn test_pin_and_apply() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, SelectionState::new()).await;

        session.pin("hair").unwrap();
        let applied = session.apply().unwrap();
        assert!(applied.is_pinned("hair"));
        assert!(applied.is_selected("hair"));

        assert!(!session.toggle("hair").unwrap());
        let applied = session.apply().unwrap();
        assert!(!applied.is_pinned("hair"));
        assert!(!applied.is_selected("hair"));
    }

    #[tokio::test]
    async fn test_unknown_package() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, SelectionState::new()).await;
        assert!(session.select("nope").is_err());
        assert!(session.set_override("nope", Category::Gear).is_err());
    }
}
