//! Selection and pin state.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which packages the user has selected, and which are pinned.
///
/// Keyed by directory id. A pinned package is always selected; pins are
/// re-asserted at the end of every load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub selected: HashMap<String, bool>,
    #[serde(default)]
    pub pinned: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, directory_id: &str) -> bool {
        self.selected.get(directory_id).copied().unwrap_or(false)
    }

    pub fn is_pinned(&self, directory_id: &str) -> bool {
        self.pinned.contains(directory_id)
    }

    /// Returns true if the entry was not selected before.
    pub fn select(&mut self, directory_id: &str) -> bool {
        let previous = self.selected.insert(directory_id.to_string(), true);
        previous != Some(true)
    }

    /// Deselecting also drops the pin.
    pub fn deselect(&mut self, directory_id: &str) {
        self.selected.insert(directory_id.to_string(), false);
        self.pinned.remove(directory_id);
    }

    /// Pin and select.
    pub fn pin(&mut self, directory_id: &str) {
        self.pinned.insert(directory_id.to_string());
        self.selected.insert(directory_id.to_string(), true);
    }

    /// Unpin; the entry stays selected.
    pub fn unpin(&mut self, directory_id: &str) {
        self.pinned.remove(directory_id);
    }

    /// Force every pinned entry to selected.
    pub fn reassert_pins(&mut self) {
        for id in &self.pinned {
            self.selected.insert(id.clone(), true);
        }
    }

    /// Selected directory ids, sorted.
    pub fn selected_ids(&self) -> BTreeSet<String> {
        self.selected
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.values().filter(|s| **s).count()
    }
}

/// Selection shared between a running load and the caller.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection(Arc<Mutex<SelectionState>>);

impl SharedSelection {
    pub fn new(state: SelectionState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, SelectionState>> {
        self.0.lock().map_err(|_| anyhow!("Selection lock poisoned"))
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Result<SelectionState> {
        Ok(self.lock()?.clone())
    }
}
