//! Loader progress and result types.

use serde::Serialize;
use std::sync::Arc;

use crate::entry::ModEntry;
use crate::selection::SelectionState;

/// Progress callback for pushed progress updates
pub type ProgressCallback = Arc<dyn Fn(LoadProgress) + Send + Sync>;

/// Stage weights for overall progress: initializing, loading, dependency
/// analysis, finalizing.
pub const STAGE_WEIGHTS: [f32; 4] = [0.05, 0.80, 0.10, 0.05];

/// Load stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LoadStage {
    Initializing,
    LoadingMods,
    AnalyzingDependencies,
    Finalizing,
    Complete,
}

impl LoadStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            LoadStage::Initializing => "Initializing",
            LoadStage::LoadingMods => "Loading mods",
            LoadStage::AnalyzingDependencies => "Analyzing dependencies",
            LoadStage::Finalizing => "Finalizing",
            LoadStage::Complete => "Complete",
        }
    }

    /// Overall progress at the start of this stage and the stage's weight.
    fn span(&self) -> (f32, f32) {
        let index = match self {
            LoadStage::Initializing => 0,
            LoadStage::LoadingMods => 1,
            LoadStage::AnalyzingDependencies => 2,
            LoadStage::Finalizing => 3,
            LoadStage::Complete => return (1.0, 0.0),
        };
        let start: f32 = STAGE_WEIGHTS[..index].iter().sum();
        (start, STAGE_WEIGHTS[index])
    }
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Snapshot of a running load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadProgress {
    pub stage: LoadStage,
    pub processed: usize,
    pub total: usize,
    pub status: String,
}

impl LoadProgress {
    pub fn new(stage: LoadStage, processed: usize, total: usize, status: impl Into<String>) -> Self {
        Self {
            stage,
            processed,
            total,
            status: status.into(),
        }
    }

    /// Progress within the current stage, 0.0..=1.0.
    pub fn stage_fraction(&self) -> f32 {
        if self.total == 0 {
            return if self.stage == LoadStage::Initializing { 0.0 } else { 1.0 };
        }
        (self.processed as f32 / self.total as f32).clamp(0.0, 1.0)
    }

    /// Weighted progress across all stages, 0.0..=1.0.
    pub fn overall_fraction(&self) -> f32 {
        let (start, weight) = self.stage.span();
        (start + weight * self.stage_fraction()).clamp(0.0, 1.0)
    }
}

impl Default for LoadProgress {
    fn default() -> Self {
        Self::new(LoadStage::Initializing, 0, 0, "Waiting")
    }
}

/// Counters collected during a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Entries classified from their manifests this load.
    pub classified: usize,
    pub cache_hits: usize,
    pub overrides_applied: usize,
    /// Manifests skipped because they failed to parse.
    pub manifest_failures: usize,
    /// Entries dropped because their store access failed.
    pub entries_failed: usize,
    pub dependencies_found: usize,
}

/// A finished load.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Sorted by display name, then directory id.
    pub entries: Vec<ModEntry>,
    /// Selection after pins were re-asserted.
    pub selection: SelectionState,
    pub stats: LoadStats,
    /// False when the requested collection was unknown and the all-disabled
    /// fallback view was produced.
    pub collection_known: bool,
}

/// How a load ended.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Complete(LoadResult),
    /// Stopped at a batch boundary; the progress it had reached.
    Cancelled(LoadProgress),
    /// The provider could not be reached.
    Unavailable(String),
}

impl LoadOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, LoadOutcome::Complete(_))
    }

    pub fn into_result(self) -> Option<LoadResult> {
        match self {
            LoadOutcome::Complete(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_overall_fraction_weights() {
        assert!(approx(LoadProgress::new(LoadStage::Initializing, 0, 0, "").overall_fraction(), 0.0));
        assert!(approx(LoadProgress::new(LoadStage::LoadingMods, 0, 10, "").overall_fraction(), 0.05));
        assert!(approx(LoadProgress::new(LoadStage::LoadingMods, 5, 10, "").overall_fraction(), 0.45));
        assert!(approx(LoadProgress::new(LoadStage::LoadingMods, 10, 10, "").overall_fraction(), 0.85));
        assert!(approx(
            LoadProgress::new(LoadStage::AnalyzingDependencies, 1, 2, "").overall_fraction(),
            0.90
        ));
        assert!(approx(LoadProgress::new(LoadStage::Finalizing, 0, 1, "").overall_fraction(), 0.95));
        assert!(approx(LoadProgress::new(LoadStage::Complete, 0, 0, "").overall_fraction(), 1.0));
    }

    #[test]
    fn test_empty_stage_counts_as_done() {
        let progress = LoadProgress::new(LoadStage::AnalyzingDependencies, 0, 0, "");
        assert!(approx(progress.stage_fraction(), 1.0));
        assert!(approx(progress.overall_fraction(), 0.95));
    }

    #[test]
    fn test_stage_order() {
        assert!(LoadStage::Initializing < LoadStage::LoadingMods);
        assert!(LoadStage::Finalizing < LoadStage::Complete);
    }
}
