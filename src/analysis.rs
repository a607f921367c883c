//! Conflict and dependency analysis for selected packages.

use serde::{Deserialize, Serialize};

use crate::dependency::DependencyKind;
use crate::entry::ModEntry;
use crate::identity::PackageIdentity;
use crate::selection::SelectionState;

/// Selection-dependent facts about one selected package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    /// A detected prerequisite is not selected.
    pub has_dependency: bool,
    /// Kind of the first unmet prerequisite.
    pub dependency_kind: Option<DependencyKind>,
    pub has_conflicts: bool,
    /// Other selected packages holding the same exclusive slot.
    pub conflicting: Vec<PackageIdentity>,
}

/// Analyze `entry` against the current selection.
pub fn analyze(entry: &ModEntry, entries: &[ModEntry], selection: &SelectionState) -> ConflictAnalysis {
    let unmet = entry
        .dependencies
        .iter()
        .find(|dep| dep.required.directory_id.is_empty() || !selection.is_selected(&dep.required.directory_id));

    let conflicting: Vec<PackageIdentity> = if entry.category.is_exclusive() {
        entries
            .iter()
            .filter(|other| other.identity != entry.identity)
            .filter(|other| other.category == entry.category)
            .filter(|other| selection.is_selected(other.directory_id()))
            .map(|other| other.identity.clone())
            .collect()
    } else {
        Vec::new()
    };

    ConflictAnalysis {
        has_dependency: unmet.is_some(),
        dependency_kind: unmet.map(|dep| dep.kind),
        has_conflicts: !conflicting.is_empty(),
        conflicting,
    }
}

/// Prerequisites that exist in the inventory but are not selected.
pub fn unmet_resolvable(entry: &ModEntry, selection: &SelectionState) -> Vec<PackageIdentity> {
    entry
        .dependencies
        .iter()
        .filter(|dep| dep.found && !dep.required.directory_id.is_empty())
        .filter(|dep| !selection.is_selected(&dep.required.directory_id))
        .map(|dep| dep.required.clone())
        .collect()
}

/// Recompute `analysis` for every entry: `Some` when selected, `None` otherwise.
pub fn refresh_all(entries: &mut [ModEntry], selection: &SelectionState) {
    let view: &[ModEntry] = entries;
    let analyses: Vec<Option<ConflictAnalysis>> = view
        .iter()
        .map(|entry| {
            selection
                .is_selected(entry.directory_id())
                .then(|| analyze(entry, view, selection))
        })
        .collect();
    for (entry, analysis) in entries.iter_mut().zip(analyses) {
        entry.analysis = analysis;
    }
}
