//! Per-package vote counting.

use crate::category::Category;

/// What a single game path is evidence of.
///
/// Finer-grained than [`Category`]: the resolution rules need to tell body
/// models from skin textures, base-slot files from other gear, and face
/// models from face paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evidence {
    Gear,
    BaseSlot,
    BodyModel,
    BodySkin,
    Tattoo,
    Hair,
    FaceModel,
    FacePaint,
    Eyes,
    EarsTails,
    Creature,
    Emote,
    StandingIdle,
    ChairSitting,
    GroundSitting,
    LyingDozing,
    Movement,
    Vfx,
    Skeleton,
    Other,
    UncategorizedTexture,
}

/// Vote counters for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTable {
    pub gear: usize,
    pub base_slot: usize,
    pub body_model: usize,
    pub body_skin: usize,
    pub tattoo: usize,
    pub hair: usize,
    pub face_model: usize,
    pub face_paint: usize,
    pub eyes: usize,
    pub ears_tails: usize,
    pub creature: usize,
    pub emote: usize,
    pub standing_idle: usize,
    pub chair_sitting: usize,
    pub ground_sitting: usize,
    pub lying_dozing: usize,
    pub movement: usize,
    pub vfx: usize,
    pub job_vfx_hits: usize,
    pub skeleton: usize,
    pub other: usize,
    pub uncategorized_textures: usize,
}

impl VoteTable {
    pub fn add(&mut self, evidence: Evidence) {
        let counter = match evidence {
            Evidence::Gear => &mut self.gear,
            Evidence::BaseSlot => &mut self.base_slot,
            Evidence::BodyModel => &mut self.body_model,
            Evidence::BodySkin => &mut self.body_skin,
            Evidence::Tattoo => &mut self.tattoo,
            Evidence::Hair => &mut self.hair,
            Evidence::FaceModel => &mut self.face_model,
            Evidence::FacePaint => &mut self.face_paint,
            Evidence::Eyes => &mut self.eyes,
            Evidence::EarsTails => &mut self.ears_tails,
            Evidence::Creature => &mut self.creature,
            Evidence::Emote => &mut self.emote,
            Evidence::StandingIdle => &mut self.standing_idle,
            Evidence::ChairSitting => &mut self.chair_sitting,
            Evidence::GroundSitting => &mut self.ground_sitting,
            Evidence::LyingDozing => &mut self.lying_dozing,
            Evidence::Movement => &mut self.movement,
            Evidence::Vfx => &mut self.vfx,
            Evidence::Skeleton => &mut self.skeleton,
            Evidence::Other => &mut self.other,
            Evidence::UncategorizedTexture => &mut self.uncategorized_textures,
        };
        *counter += 1;
    }

    /// All body votes: models plus skin textures.
    pub fn body(&self) -> usize {
        self.body_model + self.body_skin
    }

    /// Animation sub-category votes, in tie-break order.
    pub fn animation_votes(&self) -> [(Category, usize); 6] {
        [
            (Category::Emote, self.emote),
            (Category::StandingIdle, self.standing_idle),
            (Category::ChairSitting, self.chair_sitting),
            (Category::GroundSitting, self.ground_sitting),
            (Category::LyingDozing, self.lying_dozing),
            (Category::Movement, self.movement),
        ]
    }

    pub fn has_animation(&self) -> bool {
        self.animation_votes().iter().any(|(_, votes)| *votes > 0)
    }

    /// Number of idle sub-categories (standing/chair/ground/lying) with votes.
    pub fn idle_kinds(&self) -> usize {
        [
            self.standing_idle,
            self.chair_sitting,
            self.ground_sitting,
            self.lying_dozing,
        ]
        .iter()
        .filter(|votes| **votes > 0)
        .count()
    }

    /// Sum of every counter except the uncategorized-texture one.
    pub fn total(&self) -> usize {
        self.gear
            + self.base_slot
            + self.body()
            + self.tattoo
            + self.hair
            + self.face_model
            + self.face_paint
            + self.eyes
            + self.ears_tails
            + self.creature
            + self.animation_votes().iter().map(|(_, v)| v).sum::<usize>()
            + self.vfx
            + self.skeleton
            + self.other
    }

    /// Returns true if nothing at all was counted.
    pub fn is_empty(&self) -> bool {
        self.total() == 0 && self.uncategorized_textures == 0
    }
}
