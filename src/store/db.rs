//! SQLite storage for overrides and the category cache

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::{CachedCategory, OverrideRecord};
use crate::category::Category;
use crate::identity::PackageIdentity;
use crate::manifest::ContentFlags;

const CACHE_FINGERPRINT_KEY: &str = "cache_fingerprint";

/// SQLite-backed override store and category cache.
///
/// The connection sits behind a mutex so one store can be shared between the
/// loader's worker threads and the caller.
pub struct CategoryStore {
    conn: Mutex<Connection>,
}

impl CategoryStore {
    /// Open or create a store database
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )
        .context("Failed to configure SQLite pragmas")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;
        info!("Opened category store at {}", db_path.display());

        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;

        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Category store lock poisoned"))
    }

    fn create_tables(&self) -> Result<()> {
        self.lock()?
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS category_overrides (
                entry_key TEXT PRIMARY KEY,
                directory_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                category TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS category_cache (
                entry_key TEXT PRIMARY KEY,
                directory_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                category TEXT NOT NULL,
                model_only INTEGER NOT NULL DEFAULT 0,
                texture_only INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_overrides_directory ON category_overrides(directory_id);
            CREATE INDEX IF NOT EXISTS idx_cache_directory ON category_cache(directory_id);
            "#,
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    /// User override for a package, if any.
    pub fn get_override(&self, identity: &PackageIdentity) -> Result<Option<Category>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT category FROM category_overrides WHERE entry_key = ?1",
        )?;
        let stored: Option<String> = stmt
            .query_row([identity.storage_key()], |row| row.get(0))
            .optional()
            .context("Failed to query override")?;

        Ok(stored.and_then(|s| parse_stored(&s, identity)))
    }

    /// Force a category for a package.
    ///
    /// The cache row is rewritten in the same transaction so it never
    /// disagrees with the override.
    pub fn set_override(
        &self,
        identity: &PackageIdentity,
        category: Category,
        flags: ContentFlags,
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let key = identity.storage_key();
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT OR REPLACE INTO category_overrides
                (entry_key, directory_id, display_name, category, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, identity.directory_id, identity.display_name, category.as_str(), now],
        )
        .context("Failed to write override")?;
        upsert_cache(&tx, identity, category, flags, &now)?;

        tx.commit().context("Failed to commit override")?;
        debug!("Override set: {} -> {}", identity, category);
        Ok(())
    }

    /// Remove a package's override. Returns true if one existed.
    ///
    /// The cache row is dropped with it; the caller repopulates it with a
    /// fresh automatic classification.
    pub fn clear_override(&self, identity: &PackageIdentity) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let key = identity.storage_key();

        let removed = tx
            .execute("DELETE FROM category_overrides WHERE entry_key = ?1", [&key])
            .context("Failed to delete override")?;
        tx.execute("DELETE FROM category_cache WHERE entry_key = ?1", [&key])
            .context("Failed to delete cache entry")?;

        tx.commit().context("Failed to commit override removal")?;
        debug!("Override cleared: {} (existed: {})", identity, removed > 0);
        Ok(removed > 0)
    }

    /// All overrides, ordered by display name.
    pub fn list_overrides(&self) -> Result<Vec<OverrideRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT directory_id, display_name, category, updated_at
             FROM category_overrides
             ORDER BY display_name COLLATE NOCASE, directory_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list overrides")?;

        Ok(rows
            .into_iter()
            .filter_map(|(directory_id, display_name, category, updated_at)| {
                let identity = PackageIdentity::new(directory_id, display_name);
                parse_stored(&category, &identity).map(|category| OverrideRecord {
                    identity,
                    category,
                    updated_at,
                })
            })
            .collect())
    }

    /// Cached classification for a package, if any.
    pub fn get_cached(&self, identity: &PackageIdentity) -> Result<Option<CachedCategory>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT category, model_only, texture_only FROM category_cache WHERE entry_key = ?1",
        )?;
        let row: Option<(String, bool, bool)> = stmt
            .query_row([identity.storage_key()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()
            .context("Failed to query category cache")?;

        Ok(row.and_then(|(category, model_only, texture_only)| {
            parse_stored(&category, identity).map(|category| CachedCategory {
                category,
                flags: ContentFlags {
                    model_only,
                    texture_only,
                },
            })
        }))
    }

    /// Record a computed classification. One row, one statement.
    pub fn put_cached(
        &self,
        identity: &PackageIdentity,
        category: Category,
        flags: ContentFlags,
    ) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        upsert_cache(&conn, identity, category, flags, &now)
    }

    /// Make the cache match a classifier fingerprint.
    ///
    /// Cached categories were computed by one rule set with one list of body
    /// tokens. When `fingerprint` differs from the one the cache was built
    /// with (or none was recorded), every cached row is dropped and the new
    /// fingerprint recorded, in one transaction. Returns the rows dropped.
    pub fn sync_cache_fingerprint(&self, fingerprint: &str) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                [CACHE_FINGERPRINT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read cache fingerprint")?;
        if stored.as_deref() == Some(fingerprint) {
            return Ok(0);
        }

        let removed = tx
            .execute("DELETE FROM category_cache", [])
            .context("Failed to invalidate category cache")?;
        tx.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
            params![CACHE_FINGERPRINT_KEY, fingerprint],
        )
        .context("Failed to record cache fingerprint")?;
        tx.commit().context("Failed to commit cache fingerprint")?;

        if removed > 0 {
            info!("Classifier changed, dropped {} cached categories", removed);
        }
        Ok(removed)
    }

    /// Drop every cached classification. Overrides are kept.
    pub fn clear_cache(&self) -> Result<usize> {
        let removed = self
            .lock()?
            .execute("DELETE FROM category_cache", [])
            .context("Failed to clear category cache")?;
        info!("Cleared {} cached categories", removed);
        Ok(removed)
    }

    /// Number of cached classifications.
    pub fn cache_len(&self) -> Result<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM category_cache", [], |row| row.get(0))
            .context("Failed to count category cache")?;
        Ok(count as usize)
    }
}

fn upsert_cache(
    conn: &Connection,
    identity: &PackageIdentity,
    category: Category,
    flags: ContentFlags,
    now: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO category_cache
            (entry_key, directory_id, display_name, category, model_only, texture_only, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            identity.storage_key(),
            identity.directory_id,
            identity.display_name,
            category.as_str(),
            flags.model_only,
            flags.texture_only,
            now
        ],
    )
    .context("Failed to write category cache")?;
    Ok(())
}

/// Parse a stored category name; unreadable rows are ignored.
fn parse_stored(value: &str, identity: &PackageIdentity) -> Option<Category> {
    match value.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            warn!("Ignoring stored category for {}: {}", identity, e);
            None
        }
    }
}
