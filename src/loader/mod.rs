//! Batch loader.
//!
//! Builds the full entry set from a provider:
//! 1. Initializing: list packages and read collection state
//! 2. LoadingMods: override / cache / classify each package, in batches
//! 3. AnalyzingDependencies: run the dependency detector, in batches
//! 4. Finalizing: re-assert pins, analyze selected entries
//!
//! Cancellation is checked at every batch boundary. A cancelled load returns
//! [`LoadOutcome::Cancelled`]; whatever it already wrote to the category
//! cache is complete per entry.

mod config;
mod pipeline;
mod types;

pub use config::LoaderConfig;
pub use pipeline::{classify_fresh, process_package, CollectionView, EntrySource, FreshClassification};
pub(crate) use pipeline::read_description;
pub use types::*;

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis;
use crate::classifier::Classifier;
use crate::dependency::{Dependency, DependencyDetector};
use crate::entry::{self, ModEntry};
use crate::identity::PackageIdentity;
use crate::provider::{ModProvider, ProviderError};
use crate::selection::SharedSelection;
use crate::store::CategoryStore;

/// One load run.
pub struct BatchLoader {
    provider: Arc<dyn ModProvider>,
    store: Arc<CategoryStore>,
    classifier: Classifier,
    config: LoaderConfig,
    selection: SharedSelection,
    progress_tx: watch::Sender<LoadProgress>,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl BatchLoader {
    pub fn new(
        provider: Arc<dyn ModProvider>,
        store: Arc<CategoryStore>,
        config: LoaderConfig,
        selection: SharedSelection,
    ) -> Self {
        let classifier = Classifier::new().with_body_tokens(&config.body_tokens);
        let (progress_tx, _) = watch::channel(LoadProgress::default());
        Self {
            provider,
            store,
            classifier,
            config,
            selection,
            progress_tx,
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set a callback for pushed progress updates
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receiver for polled progress.
    pub fn subscribe(&self) -> watch::Receiver<LoadProgress> {
        self.progress_tx.subscribe()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn report(&self, progress: LoadProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress.clone());
        }
        self.progress_tx.send_replace(progress);
    }

    fn current_progress(&self) -> LoadProgress {
        self.progress_tx.borrow().clone()
    }

    fn cancelled_outcome(&self) -> LoadOutcome {
        let progress = self.current_progress();
        info!("Load cancelled during {} ({}/{})", progress.stage, progress.processed, progress.total);
        LoadOutcome::Cancelled(progress)
    }

    /// Run the load to completion, cancellation, or provider failure.
    pub async fn run(self) -> Result<LoadOutcome> {
        self.config
            .validate()
            .context("Invalid loader configuration")?;
        let started = Instant::now();

        // Stage 1: inventory and collection state
        self.report(LoadProgress::new(LoadStage::Initializing, 0, 0, "Reading mod inventory"));

        let provider = Arc::clone(&self.provider);
        let store = Arc::clone(&self.store);
        let collection_id = self.config.collection_id.clone();
        let fingerprint = self.classifier.fingerprint();
        let inventory = tokio::task::spawn_blocking(move || {
            store.sync_cache_fingerprint(&fingerprint).map_err(InventoryError::Other)?;
            read_inventory(provider.as_ref(), &collection_id)
        })
        .await
        .context("Inventory task panicked")?;

        let (packages, view) = match inventory {
            Ok(inventory) => inventory,
            Err(InventoryError::Unavailable(message)) => {
                warn!("Mod provider unavailable: {}", message);
                return Ok(LoadOutcome::Unavailable(message));
            }
            Err(InventoryError::Other(e)) => return Err(e),
        };
        let collection_known = view.is_some();
        if !collection_known {
            warn!(
                "Unknown collection '{}', showing every package unclassified and disabled",
                self.config.collection_id
            );
        }
        info!("Found {} packages in {:.1}s", packages.len(), started.elapsed().as_secs_f32());

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_outcome());
        }

        // Stage 2: classify in batches
        let mut stats = LoadStats::default();
        let entries = match self.load_entries(&packages, view, &mut stats).await? {
            Some(entries) => entries,
            None => return Ok(self.cancelled_outcome()),
        };
        info!(
            "Loaded {} entries ({} classified, {} cached, {} overridden) in {:.1}s",
            entries.len(),
            stats.classified,
            stats.cache_hits,
            stats.overrides_applied,
            started.elapsed().as_secs_f32()
        );

        // Stage 3: dependencies
        let mut entries = if collection_known {
            match self.analyze_dependencies(entries, &mut stats).await? {
                Some(entries) => entries,
                None => return Ok(self.cancelled_outcome()),
            }
        } else {
            entries
        };

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_outcome());
        }

        // Stage 4: pins and analysis
        self.report(LoadProgress::new(LoadStage::Finalizing, 0, 1, "Applying selection"));
        entry::sort_entries(&mut entries);
        let selection = {
            let mut selection = self.selection.lock()?;
            selection.reassert_pins();
            selection.clone()
        };
        analysis::refresh_all(&mut entries, &selection);

        self.report(LoadProgress::new(
            LoadStage::Complete,
            entries.len(),
            entries.len(),
            format!("Loaded {} packages", entries.len()),
        ));
        info!("Load complete in {:.1}s", started.elapsed().as_secs_f32());

        Ok(LoadOutcome::Complete(LoadResult {
            entries,
            selection,
            stats,
            collection_known,
        }))
    }

    /// Returns `None` when cancelled between batches.
    async fn load_entries(
        &self,
        packages: &[PackageIdentity],
        view: Option<CollectionView>,
        stats: &mut LoadStats,
    ) -> Result<Option<Vec<ModEntry>>> {
        let total = packages.len();
        let view = view.map(Arc::new);
        let mut entries = Vec::with_capacity(total);
        let mut processed = 0;

        self.report(LoadProgress::new(LoadStage::LoadingMods, 0, total, "Classifying packages"));

        for batch in packages.chunks(self.config.batch_size) {
            let batch: Vec<PackageIdentity> = batch.to_vec();
            let batch_len = batch.len();
            let provider = Arc::clone(&self.provider);
            let store = Arc::clone(&self.store);
            let classifier = self.classifier.clone();
            let view = view.clone();

            let results = tokio::task::spawn_blocking(move || {
                batch
                    .par_iter()
                    .map(|identity| {
                        let result = match view.as_deref() {
                            Some(view) => pipeline::process_package(
                                provider.as_ref(),
                                &store,
                                &classifier,
                                identity,
                                view,
                            ),
                            None => pipeline::process_unclassified(&store, identity),
                        };
                        (identity.clone(), result)
                    })
                    .collect::<Vec<_>>()
            })
            .await
            .context("Classification batch panicked")?;

            for (identity, result) in results {
                match result {
                    Ok(processed_entry) => {
                        match processed_entry.source {
                            EntrySource::Override => stats.overrides_applied += 1,
                            EntrySource::Cache => stats.cache_hits += 1,
                            EntrySource::Classified => stats.classified += 1,
                            EntrySource::Unclassified => {}
                        }
                        stats.manifest_failures += processed_entry.manifest_failures;
                        entries.push(processed_entry.entry);
                    }
                    Err(e) => {
                        stats.entries_failed += 1;
                        warn!("Dropping {}: {:#}", identity, e);
                    }
                }
            }

            processed += batch_len;
            self.report(LoadProgress::new(
                LoadStage::LoadingMods,
                processed,
                total,
                format!("Classified {}/{} packages", processed, total),
            ));

            tokio::task::yield_now().await;
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
        }

        Ok(Some(entries))
    }

    /// Returns `None` when cancelled between batches.
    async fn analyze_dependencies(
        &self,
        entries: Vec<ModEntry>,
        stats: &mut LoadStats,
    ) -> Result<Option<Vec<ModEntry>>> {
        let eligible: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| DependencyDetector::applies_to(entry))
            .map(|(index, _)| index)
            .collect();
        let total = eligible.len();
        self.report(LoadProgress::new(
            LoadStage::AnalyzingDependencies,
            0,
            total,
            "Detecting dependencies",
        ));

        let shared = Arc::new(entries);
        let body_tokens = self.classifier.body_tokens();
        let mut found: Vec<(usize, Vec<Dependency>)> = Vec::new();
        let mut processed = 0;

        for batch in eligible.chunks(self.config.batch_size) {
            let batch: Vec<usize> = batch.to_vec();
            let batch_len = batch.len();
            let shared_entries = Arc::clone(&shared);
            let tokens = body_tokens.clone();

            let results = tokio::task::spawn_blocking(move || {
                let detector = DependencyDetector::new(&shared_entries, tokens);
                batch
                    .par_iter()
                    .map(|&index| (index, detector.detect(&shared_entries[index])))
                    .filter(|(_, deps)| !deps.is_empty())
                    .collect::<Vec<_>>()
            })
            .await
            .context("Dependency batch panicked")?;
            found.extend(results);

            processed += batch_len;
            self.report(LoadProgress::new(
                LoadStage::AnalyzingDependencies,
                processed,
                total,
                format!("Checked {}/{} model-only packages", processed, total),
            ));

            tokio::task::yield_now().await;
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
        }

        let mut entries = Arc::try_unwrap(shared).unwrap_or_else(|shared| shared.as_ref().clone());
        for (index, deps) in found {
            stats.dependencies_found += deps.len();
            debug!("{} has {} dependencies", entries[index].identity, deps.len());
            entries[index].dependencies = deps;
        }
        Ok(Some(entries))
    }
}

enum InventoryError {
    Unavailable(String),
    Other(anyhow::Error),
}

/// Packages plus collection state; `None` view means the collection is unknown.
fn read_inventory(
    provider: &dyn ModProvider,
    collection_id: &str,
) -> Result<(Vec<PackageIdentity>, Option<CollectionView>), InventoryError> {
    let packages = provider.list_packages().map_err(provider_error)?;

    let settings = match provider.collection_settings(collection_id) {
        Ok(settings) => settings,
        Err(ProviderError::UnknownCollection(_)) => return Ok((packages, None)),
        Err(e) => return Err(provider_error(e)),
    };
    let affecting = match provider.currently_affecting(collection_id) {
        Ok(affecting) => affecting,
        Err(ProviderError::UnknownCollection(_)) => return Ok((packages, None)),
        Err(e) => return Err(provider_error(e)),
    };

    Ok((packages, Some(CollectionView { settings, affecting })))
}

fn provider_error(e: ProviderError) -> InventoryError {
    match e {
        ProviderError::Unavailable(message) => InventoryError::Unavailable(message),
        other => InventoryError::Other(anyhow!(other)),
    }
}

/// Handle to a spawned load.
pub struct LoadHandle {
    progress: watch::Receiver<LoadProgress>,
    cancel: CancellationToken,
    task: JoinHandle<Result<LoadOutcome>>,
}

impl LoadHandle {
    /// Receiver for polled progress.
    pub fn progress(&self) -> watch::Receiver<LoadProgress> {
        self.progress.clone()
    }

    /// Latest progress snapshot.
    pub fn latest(&self) -> LoadProgress {
        self.progress.borrow().clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the load to end.
    pub async fn wait(self) -> Result<LoadOutcome> {
        self.task.await.context("Load task panicked")?
    }
}

/// Starts loads, one at a time.
///
/// Starting a load cancels the previous one, and the new load waits for the
/// previous one to stop before it touches the selection.
pub struct ModLoader {
    provider: Arc<dyn ModProvider>,
    store: Arc<CategoryStore>,
    config: LoaderConfig,
    progress_callback: Option<ProgressCallback>,
    active: Option<CancellationToken>,
    run_lock: Arc<AsyncMutex<()>>,
}

impl ModLoader {
    pub fn new(provider: Arc<dyn ModProvider>, store: Arc<CategoryStore>, config: LoaderConfig) -> Self {
        Self {
            provider,
            store,
            config,
            progress_callback: None,
            active: None,
            run_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Set a callback for pushed progress updates
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    pub fn store(&self) -> &Arc<CategoryStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn ModProvider> {
        &self.provider
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Cancel any running load and spawn a new one.
    pub fn start(&mut self, selection: SharedSelection) -> LoadHandle {
        self.cancel();

        let mut loader = BatchLoader::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.store),
            self.config.clone(),
            selection,
        );
        if let Some(ref callback) = self.progress_callback {
            loader.set_progress_callback(Arc::clone(callback));
        }
        let cancel = loader.cancellation_token();
        let progress = loader.subscribe();
        let run_lock = Arc::clone(&self.run_lock);

        let task = tokio::spawn(async move {
            let _guard = run_lock.lock_owned().await;
            loader.run().await
        });

        self.active = Some(cancel.clone());
        LoadHandle {
            progress,
            cancel,
            task,
        }
    }

    /// Cancel the running load, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.active.take() {
            if !token.is_cancelled() {
                debug!("Cancelling previous load");
            }
            token.cancel();
        }
    }
}
