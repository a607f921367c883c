//! modsift - mod classification and slot-conflict analysis

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use modsift::classifier::{ClassifyInput, Classifier};
use modsift::loader::{self, LoadOutcome, LoadProgress, ModLoader};
use modsift::manifest;
use modsift::provider::{DirectoryProvider, ModProvider};
use modsift::settings::Settings;
use modsift::{Category, CategoryStore, ModEntry, SelectionState, Session, SharedSelection};

#[derive(Parser)]
#[command(name = "modsift")]
#[command(version)]
#[command(about = "Classify character mod packages and check selections for slot conflicts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Override/cache database (defaults to the settings value)
    #[arg(long, global = true, env = "MODSIFT_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every package in a mods root
    Scan {
        /// Directory with one subdirectory per package (defaults to the settings value)
        mods_root: Option<PathBuf>,

        /// Exported collection state
        #[arg(long)]
        collection_file: Option<PathBuf>,

        /// Collection to read enabled/priority state from
        #[arg(short, long)]
        collection: Option<String>,

        /// Select a package after loading (repeatable)
        #[arg(short, long)]
        select: Vec<String>,

        /// Pin a package after loading (repeatable)
        #[arg(short, long)]
        pin: Vec<String>,

        /// Selection state to start from; updated after the scan
        #[arg(long)]
        selection_file: Option<PathBuf>,

        /// Only show packages in this category
        #[arg(long)]
        category: Option<Category>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a single package directory
    Classify {
        /// Package directory
        package_dir: PathBuf,

        /// Display name (defaults to meta.json Name, then the directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage category overrides
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },

    /// Drop every cached classification (overrides are kept)
    ClearCache,
}

#[derive(Subcommand)]
enum OverrideAction {
    /// Force a package's category
    Set {
        /// Package directory id
        directory: String,
        /// Category name (e.g. Body, Hair, JobVFX)
        category: Category,
        /// Mods root (defaults to the settings value)
        #[arg(long)]
        mods_root: Option<PathBuf>,
    },

    /// Remove a package's override and re-classify it
    Clear {
        /// Package directory id
        directory: String,
        /// Mods root (defaults to the settings value)
        #[arg(long)]
        mods_root: Option<PathBuf>,
    },

    /// List all overrides
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env()
            .add_directive(if cli.verbose { "modsift=debug".parse()? } else { "modsift=warn".parse()? });
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
        if cli.log_json {
            builder.json().init();
        } else {
            builder.init();
        }
    }

    let settings = Settings::load();
    let db_path = match cli.db {
        Some(path) => path,
        None => settings.database_path()?,
    };

    match cli.command {
        Commands::Scan {
            mods_root,
            collection_file,
            collection,
            select,
            pin,
            selection_file,
            category,
            json,
        } => {
            let mut settings = settings;
            if let Some(root) = mods_root {
                settings.mods_root = root.to_string_lossy().to_string();
            }
            if let Some(file) = collection_file {
                settings.collection_file = file.to_string_lossy().to_string();
            }
            if let Some(id) = collection {
                settings.collection_id = id;
            }
            settings.validate()?;

            let mut provider = DirectoryProvider::new(&settings.mods_root);
            if let Some(file) = settings.collection_file() {
                provider = provider.with_collection_file(file);
            }
            let provider: Arc<dyn ModProvider> = Arc::new(provider);
            let store = Arc::new(CategoryStore::open(&db_path)?);
            let config = settings.loader_config();

            let initial = match &selection_file {
                Some(path) => read_selection(path)?,
                None => SelectionState::new(),
            };
            let shared = SharedSelection::new(initial);

            let outcome = run_scan(Arc::clone(&provider), Arc::clone(&store), &config, shared.clone()).await?;
            let result = match outcome {
                LoadOutcome::Complete(result) => result,
                LoadOutcome::Cancelled(progress) => {
                    bail!("Scan cancelled during {}", progress.stage)
                }
                LoadOutcome::Unavailable(message) => {
                    bail!("Mod provider unavailable: {}", message)
                }
            };

            if !result.collection_known {
                eprintln!(
                    "Collection '{}' not found; packages shown unclassified and disabled.",
                    config.collection_id
                );
            }
            let stats = result.stats;

            let mut session = Session::new(result, shared, store, provider, &config)?;
            for directory in &select {
                let pulled = session.select(directory)?;
                for required in pulled {
                    println!("Selected {} (required by {})", required, directory);
                }
            }
            for directory in &pin {
                session.pin(directory)?;
            }

            let entries: Vec<&ModEntry> = match category {
                Some(category) => session.entries_in(category).collect(),
                None => session.entries().iter().collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries(&entries);
                println!();
                println!(
                    "{} packages: {} classified, {} cached, {} overridden, {} dependencies, {} manifest errors",
                    session.entries().len(),
                    stats.classified,
                    stats.cache_hits,
                    stats.overrides_applied,
                    stats.dependencies_found,
                    stats.manifest_failures
                );
            }

            if let Some(path) = selection_file {
                write_selection(&path, &session.apply()?)?;
            }
        }

        Commands::Classify { package_dir, name } => {
            if !package_dir.is_dir() {
                bail!("Package directory not found: {}", package_dir.display());
            }
            let name = name
                .or_else(|| manifest::read_meta(&package_dir).map(|meta| meta.name))
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| {
                    package_dir
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                });

            let extracted = manifest::extract_game_paths(&package_dir);
            let classifier = Classifier::new().with_body_tokens(&settings.body_tokens);
            let result = classifier.classify_detailed(&ClassifyInput::new(&name, &extracted.paths));
            let flags = extracted.content_flags();

            println!("Name:       {}", name);
            println!("Game paths: {}", extracted.paths.len());
            println!(
                "Manifests:  {} read, {} failed",
                extracted.manifests_read, extracted.manifests_failed
            );
            println!("Category:   {}", result.category.display_name());
            println!("Source:     {:?}", result.source);
            if flags.model_only {
                println!("Contents:   models only");
            } else if flags.texture_only {
                println!("Contents:   textures only");
            }
        }

        Commands::Override { action } => {
            let store = CategoryStore::open(&db_path)?;
            match action {
                OverrideAction::Set {
                    directory,
                    category,
                    mods_root,
                } => {
                    let provider = directory_provider(mods_root, &settings)?;
                    let identity = find_package(&provider, &directory)?;
                    let classifier = Classifier::new().with_body_tokens(&settings.body_tokens);
                    store.sync_cache_fingerprint(&classifier.fingerprint())?;
                    let fresh = loader::classify_fresh(&provider, &classifier, &identity);
                    store.set_override(&identity, category, fresh.flags)?;
                    println!("{}: {} (automatic: {})", identity, category, fresh.category);
                }
                OverrideAction::Clear { directory, mods_root } => {
                    let provider = directory_provider(mods_root, &settings)?;
                    let identity = find_package(&provider, &directory)?;
                    let existed = store.clear_override(&identity)?;

                    let classifier = Classifier::new().with_body_tokens(&settings.body_tokens);
                    store.sync_cache_fingerprint(&classifier.fingerprint())?;
                    let fresh = loader::classify_fresh(&provider, &classifier, &identity);
                    if fresh.is_cacheable() {
                        store.put_cached(&identity, fresh.category, fresh.flags)?;
                    }
                    if existed {
                        println!("{}: override removed, now {}", identity, fresh.category);
                    } else {
                        println!("{}: no override, {}", identity, fresh.category);
                    }
                }
                OverrideAction::List => {
                    let overrides = store.list_overrides()?;
                    if overrides.is_empty() {
                        println!("No overrides.");
                    }
                    for record in overrides {
                        println!(
                            "{:<14} {}  ({})",
                            record.category.display_name(),
                            record.identity,
                            record.updated_at
                        );
                    }
                }
            }
        }

        Commands::ClearCache => {
            let store = CategoryStore::open(&db_path)?;
            let removed = store.clear_cache()?;
            println!("Removed {} cached categories", removed);
        }
    }

    Ok(())
}

async fn run_scan(
    provider: Arc<dyn ModProvider>,
    store: Arc<CategoryStore>,
    config: &loader::LoaderConfig,
    selection: SharedSelection,
) -> Result<LoadOutcome> {
    let pb = ProgressBar::new(1000);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% | {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut mod_loader = ModLoader::new(provider, store, config.clone());
    let bar = pb.clone();
    mod_loader.set_progress_callback(Arc::new(move |progress: LoadProgress| {
        bar.set_position((progress.overall_fraction() * 1000.0) as u64);
        bar.set_message(progress.status);
    }));

    let handle = mod_loader.start(selection);
    let cancel_on_interrupt = {
        let handle_cancel = handle.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle_cancel.cancel();
            }
        })
    };

    let outcome = handle.wait().await;
    cancel_on_interrupt.abort();
    pb.finish_and_clear();
    outcome
}

fn directory_provider(mods_root: Option<PathBuf>, settings: &Settings) -> Result<DirectoryProvider> {
    let root = match mods_root {
        Some(root) => root,
        None if !settings.mods_root.is_empty() => PathBuf::from(&settings.mods_root),
        None => bail!("No mods root given and none set in {:?}", Settings::settings_path()?),
    };
    let mut provider = DirectoryProvider::new(root);
    if let Some(file) = settings.collection_file() {
        provider = provider.with_collection_file(file);
    }
    Ok(provider)
}

fn find_package(provider: &DirectoryProvider, directory: &str) -> Result<modsift::PackageIdentity> {
    provider
        .list_packages()?
        .into_iter()
        .find(|p| p.directory_id == directory)
        .with_context(|| format!("Package not found: {}", directory))
}

fn print_entries(entries: &[&ModEntry]) {
    for entry in entries {
        let mut marks = Vec::new();
        if entry.enabled {
            marks.push("enabled".to_string());
        }
        if entry.affecting {
            marks.push("active".to_string());
        }
        if entry.has_only_model_files() {
            marks.push("models only".to_string());
        } else if entry.has_only_texture_files() {
            marks.push("textures only".to_string());
        }
        let marks = if marks.is_empty() {
            String::new()
        } else {
            format!(" [{}]", marks.join(", "))
        };

        println!("{:<16} {}{}", entry.category.display_name(), entry.identity, marks);

        for dep in &entry.dependencies {
            let status = if dep.found { "" } else { " (not installed)" };
            println!("{:<16}   requires {}{}", "", dep.required.display_name, status);
        }
        if let Some(analysis) = &entry.analysis {
            for other in &analysis.conflicting {
                println!("{:<16}   conflicts with {}", "", other);
            }
            if analysis.has_dependency {
                println!("{:<16}   missing a required package", "");
            }
        }
    }
}

fn read_selection(path: &Path) -> Result<SelectionState> {
    if !path.exists() {
        return Ok(SelectionState::new());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn write_selection(path: &Path, selection: &SelectionState) -> Result<()> {
    let content = serde_json::to_string_pretty(selection).context("Failed to serialize selection")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
