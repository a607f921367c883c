//! Per-package processing used by the loader and the session.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::category::Category;
use crate::classifier::{patterns, ClassifyInput, Classifier};
use crate::dependency::DependencyDetector;
use crate::entry::ModEntry;
use crate::identity::PackageIdentity;
use crate::manifest::{self, ContentFlags, ExtractedPaths};
use crate::provider::{ModProvider, ModSettings};
use crate::store::CategoryStore;

/// Collection state the entries are built against.
#[derive(Debug, Clone, Default)]
pub struct CollectionView {
    pub settings: HashMap<String, ModSettings>,
    pub affecting: HashSet<String>,
}

/// Where an entry's category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Override,
    Cache,
    Classified,
    /// Unknown-collection fallback: no classification ran.
    Unclassified,
}

/// One processed package.
#[derive(Debug, Clone)]
pub struct ProcessedEntry {
    pub entry: ModEntry,
    pub source: EntrySource,
    pub manifest_failures: usize,
}

/// A classification computed from the package's manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshClassification {
    pub category: Category,
    pub flags: ContentFlags,
    pub manifest_failures: usize,
    /// Changed-item labels decided the category.
    pub label_dependent: bool,
}

impl FreshClassification {
    /// Labels come from the provider on every load and are not part of the
    /// cache key, so label-dependent answers are never cached.
    pub fn is_cacheable(&self) -> bool {
        !self.label_dependent
    }
}

/// Classify a package from its manifests, ignoring overrides and the cache.
pub fn classify_fresh(
    provider: &dyn ModProvider,
    classifier: &Classifier,
    identity: &PackageIdentity,
) -> FreshClassification {
    let extracted = provider
        .package_dir(&identity.directory_id)
        .map(|dir| manifest::extract_game_paths(&dir))
        .unwrap_or_else(ExtractedPaths::default);

    // Labels are only needed to tell mounts from minions.
    let label_dependent = extracted.paths.iter().any(|p| patterns::is_creature_path(p));
    let labels = if label_dependent {
        provider
            .changed_item_labels(&identity.directory_id)
            .unwrap_or_else(|e| {
                warn!("Failed to read changed items for {}: {}", identity, e);
                Vec::new()
            })
    } else {
        Vec::new()
    };

    let input = ClassifyInput::new(&identity.display_name, &extracted.paths).with_changed_items(&labels);
    FreshClassification {
        category: classifier.classify(&input),
        flags: extracted.content_flags(),
        manifest_failures: extracted.manifests_failed,
        label_dependent,
    }
}

/// Build the entry for one package: override, then cache, then manifests.
///
/// Every store write for the package is a single statement or transaction.
pub fn process_package(
    provider: &dyn ModProvider,
    store: &CategoryStore,
    classifier: &Classifier,
    identity: &PackageIdentity,
    view: &CollectionView,
) -> Result<ProcessedEntry> {
    let mut manifest_failures = 0;

    let (category, flags, source) = if let Some(category) = store.get_override(identity)? {
        let flags = match store.get_cached(identity)? {
            Some(cached) => cached.flags,
            None => {
                let fresh = classify_fresh(provider, classifier, identity);
                manifest_failures = fresh.manifest_failures;
                store.put_cached(identity, category, fresh.flags)?;
                fresh.flags
            }
        };
        (category, flags, EntrySource::Override)
    } else if let Some(cached) = store.get_cached(identity)? {
        (cached.category, cached.flags, EntrySource::Cache)
    } else {
        let fresh = classify_fresh(provider, classifier, identity);
        manifest_failures = fresh.manifest_failures;
        if fresh.is_cacheable() {
            store.put_cached(identity, fresh.category, fresh.flags)?;
        }
        (fresh.category, fresh.flags, EntrySource::Classified)
    };

    let mut entry = ModEntry::new(identity.clone(), category);
    entry.flags = flags;
    apply_collection_state(&mut entry, view);
    if DependencyDetector::applies_to(&entry) {
        entry.description = read_description(provider, identity);
    }

    Ok(ProcessedEntry {
        entry,
        source,
        manifest_failures,
    })
}

/// Entry for the unknown-collection fallback: overrides only, nothing
/// classified, nothing written.
pub fn process_unclassified(store: &CategoryStore, identity: &PackageIdentity) -> Result<ProcessedEntry> {
    let override_category = store.get_override(identity)?;
    let flags = store
        .get_cached(identity)?
        .map(|cached| cached.flags)
        .unwrap_or_default();

    let mut entry = ModEntry::new(identity.clone(), override_category.unwrap_or(Category::Unknown));
    entry.flags = flags;

    Ok(ProcessedEntry {
        entry,
        source: if override_category.is_some() {
            EntrySource::Override
        } else {
            EntrySource::Unclassified
        },
        manifest_failures: 0,
    })
}

fn apply_collection_state(entry: &mut ModEntry, view: &CollectionView) {
    let settings = view
        .settings
        .get(&entry.identity.directory_id)
        .copied()
        .unwrap_or_default();
    entry.enabled = settings.enabled;
    entry.priority = settings.priority;
    entry.affecting = view.affecting.contains(&entry.identity.directory_id);
}

pub(crate) fn read_description(provider: &dyn ModProvider, identity: &PackageIdentity) -> String {
    provider
        .package_dir(&identity.directory_id)
        .and_then(|dir| manifest::read_meta(&dir))
        .map(|meta| meta.description)
        .unwrap_or_default()
}
