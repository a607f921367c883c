//! Durable category state.
//!
//! Two tables in one SQLite database:
//! - overrides: user-forced categories, always consulted first;
//! - cache: last computed category per package, a pure speed-up.
//!
//! Both are keyed by [`PackageIdentity::storage_key`](crate::identity::PackageIdentity::storage_key).

mod db;

pub use db::CategoryStore;

use crate::category::Category;
use crate::identity::PackageIdentity;
use crate::manifest::ContentFlags;

/// A cached classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedCategory {
    pub category: Category,
    pub flags: ContentFlags,
}

/// One row of the override table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    pub identity: PackageIdentity,
    pub category: Category,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}
