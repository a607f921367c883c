//! Category definitions for mod classification.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Semantic slot a mod package is sorted into.
///
/// `Unknown` means no evidence was found at all; `Other` means evidence was
/// found but it did not fit any of the specific tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Gear,
    Hair,
    Face,
    Eyes,
    Tattoos,
    FacePaint,
    Body,
    EarsTails,
    Mount,
    Minion,
    Emote,
    StandingIdle,
    ChairSitting,
    GroundSitting,
    LyingDozing,
    MixedIdle,
    Movement,
    #[serde(rename = "JobVFX")]
    JobVfx,
    #[serde(rename = "VFX")]
    Vfx,
    Skeleton,
    Other,
    Unknown,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 22] = [
        Category::Gear,
        Category::Hair,
        Category::Face,
        Category::Eyes,
        Category::Tattoos,
        Category::FacePaint,
        Category::Body,
        Category::EarsTails,
        Category::Mount,
        Category::Minion,
        Category::Emote,
        Category::StandingIdle,
        Category::ChairSitting,
        Category::GroundSitting,
        Category::LyingDozing,
        Category::MixedIdle,
        Category::Movement,
        Category::JobVfx,
        Category::Vfx,
        Category::Skeleton,
        Category::Other,
        Category::Unknown,
    ];

    /// Stable identifier used for storage and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gear => "Gear",
            Category::Hair => "Hair",
            Category::Face => "Face",
            Category::Eyes => "Eyes",
            Category::Tattoos => "Tattoos",
            Category::FacePaint => "FacePaint",
            Category::Body => "Body",
            Category::EarsTails => "EarsTails",
            Category::Mount => "Mount",
            Category::Minion => "Minion",
            Category::Emote => "Emote",
            Category::StandingIdle => "StandingIdle",
            Category::ChairSitting => "ChairSitting",
            Category::GroundSitting => "GroundSitting",
            Category::LyingDozing => "LyingDozing",
            Category::MixedIdle => "MixedIdle",
            Category::Movement => "Movement",
            Category::JobVfx => "JobVFX",
            Category::Vfx => "VFX",
            Category::Skeleton => "Skeleton",
            Category::Other => "Other",
            Category::Unknown => "Unknown",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::EarsTails => "Ears & Tails",
            Category::FacePaint => "Face Paint",
            Category::StandingIdle => "Standing Idle",
            Category::ChairSitting => "Chair Sitting",
            Category::GroundSitting => "Ground Sitting",
            Category::LyingDozing => "Lying / Dozing",
            Category::MixedIdle => "Mixed Idle",
            Category::JobVfx => "Job VFX",
            other => other.as_str(),
        }
    }

    /// Returns true for the animation family resolved by the idle/emote rules.
    pub fn is_animation(&self) -> bool {
        matches!(
            self,
            Category::Emote
                | Category::StandingIdle
                | Category::ChairSitting
                | Category::GroundSitting
                | Category::LyingDozing
                | Category::MixedIdle
                | Category::Movement
        )
    }

    /// Returns true if at most one selected package may hold this category.
    ///
    /// These are whole-slot replacements for the same anatomy; two of them
    /// selected together overwrite each other.
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            Category::Body | Category::Face | Category::Eyes | Category::Skeleton
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct CategoryParseError(pub String);

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}
