//! Ordered classification rules.
//!
//! Two tables drive classification:
//! - `PATH_RULES` turns each game path into one piece of [`Evidence`]; the
//!   first rule that matches wins.
//! - `RESOLVE_RULES` turns the finished [`VoteTable`] into a category; the
//!   rules are a precedence chain and later rules only run when every
//!   earlier one declined.

use super::patterns;
use super::votes::{Evidence, VoteTable};
use crate::category::Category;
use crate::manifest;
use crate::paths;

/// Inputs visible to a path rule.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    /// Normalized game path.
    pub path: &'a str,
    /// The package name carries a tattoo/overlay keyword.
    pub name_has_tattoo: bool,
}

/// A named path predicate.
pub struct PathRule {
    pub name: &'static str,
    pub evaluate: fn(&PathContext<'_>) -> Option<Evidence>,
}

/// Path rules in evaluation order.
pub const PATH_RULES: &[PathRule] = &[
    PathRule { name: "creature", evaluate: creature_rule },
    PathRule { name: "skeleton", evaluate: skeleton_rule },
    PathRule { name: "animation", evaluate: animation_rule },
    PathRule { name: "vfx", evaluate: vfx_rule },
    PathRule { name: "hair", evaluate: hair_rule },
    PathRule { name: "ears_tails", evaluate: ears_tails_rule },
    PathRule { name: "eyes", evaluate: eyes_rule },
    PathRule { name: "face_decal", evaluate: face_decal_rule },
    PathRule { name: "face", evaluate: face_rule },
    PathRule { name: "body_model", evaluate: body_model_rule },
    PathRule { name: "body_skin", evaluate: body_skin_rule },
    PathRule { name: "base_slot", evaluate: base_slot_rule },
    PathRule { name: "gear", evaluate: gear_rule },
];

/// Evidence for one path: the first matching rule, otherwise an
/// uncategorized texture or `Other`.
pub fn evidence_for(ctx: &PathContext<'_>) -> Evidence {
    PATH_RULES
        .iter()
        .find_map(|rule| (rule.evaluate)(ctx))
        .unwrap_or_else(|| {
            if manifest::is_texture_path(ctx.path) {
                Evidence::UncategorizedTexture
            } else {
                Evidence::Other
            }
        })
}

fn skeleton_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::has_extension(ctx.path, patterns::SKELETON_EXTENSIONS).then_some(Evidence::Skeleton)
}

fn animation_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    if !patterns::is_animation_path(ctx.path) {
        return None;
    }
    Some(animation_evidence(ctx.path))
}

/// Sub-category of an animation file, from its file name.
pub fn animation_evidence(path: &str) -> Evidence {
    let stem = paths::file_stem(path);
    let has = |tokens: &[&str]| tokens.iter().any(|t| stem.contains(t));

    if has(patterns::CHAIR_SIT_TOKENS) {
        Evidence::ChairSitting
    } else if has(patterns::GROUND_SIT_TOKENS) {
        Evidence::GroundSitting
    } else if has(patterns::LYING_TOKENS) {
        Evidence::LyingDozing
    } else if has(patterns::MOVEMENT_TOKENS) {
        Evidence::Movement
    } else if has(patterns::STANDING_IDLE_TOKENS) {
        Evidence::StandingIdle
    } else {
        Evidence::Emote
    }
}

fn vfx_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_vfx_path(ctx.path).then_some(Evidence::Vfx)
}

fn creature_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_creature_path(ctx.path).then_some(Evidence::Creature)
}

fn hair_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_human_part(ctx.path, "hair").then_some(Evidence::Hair)
}

fn ears_tails_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    (patterns::is_human_part(ctx.path, "zear") || patterns::is_human_part(ctx.path, "tail"))
        .then_some(Evidence::EarsTails)
}

fn eyes_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_eye_path(ctx.path).then_some(Evidence::Eyes)
}

fn face_decal_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_face_decal_path(ctx.path).then_some(Evidence::FacePaint)
}

fn face_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    if !patterns::is_human_part(ctx.path, "face") {
        return None;
    }
    if manifest::is_model_path(ctx.path) {
        Some(Evidence::FaceModel)
    } else {
        Some(Evidence::FacePaint)
    }
}

fn body_model_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    (patterns::is_human_part(ctx.path, "body") && manifest::is_model_path(ctx.path))
        .then_some(Evidence::BodyModel)
}

fn body_skin_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    if !(patterns::is_human_part(ctx.path, "body") || patterns::is_skin_texture_path(ctx.path)) {
        return None;
    }
    if ctx.name_has_tattoo {
        Some(Evidence::Tattoo)
    } else {
        Some(Evidence::BodySkin)
    }
}

fn base_slot_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_base_slot_path(ctx.path).then_some(Evidence::BaseSlot)
}

fn gear_rule(ctx: &PathContext<'_>) -> Option<Evidence> {
    patterns::is_gear_path(ctx.path).then_some(Evidence::Gear)
}

/// Inputs visible to a resolution rule.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub votes: &'a VoteTable,
    /// The package name contains a body-framework token.
    pub name_is_body_framework: bool,
    /// A job keyword appeared in the package name.
    pub name_has_job_keyword: bool,
}

/// Outcome of the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Category),
    /// Creature paths won; the final answer comes from changed-item labels.
    Creature,
}

/// A named resolution rule.
pub struct ResolveRule {
    pub name: &'static str,
    pub evaluate: fn(&ResolveContext<'_>) -> Option<Resolution>,
}

/// Resolution rules in precedence order.
pub const RESOLVE_RULES: &[ResolveRule] = &[
    ResolveRule { name: "body_with_base_slot", evaluate: body_with_base_slot },
    ResolveRule { name: "sculpt_over_makeup", evaluate: sculpt_over_makeup },
    ResolveRule { name: "hair_with_loose_textures", evaluate: hair_with_loose_textures },
    ResolveRule { name: "framework_body", evaluate: framework_body },
    ResolveRule { name: "gear_dominant", evaluate: gear_dominant },
    ResolveRule { name: "creature", evaluate: creature },
    ResolveRule { name: "animation", evaluate: animation },
    ResolveRule { name: "vfx", evaluate: vfx },
    ResolveRule { name: "highest_vote", evaluate: highest_vote },
];

/// Run the chain; returns the name of the rule that decided and its result.
pub fn resolve(ctx: &ResolveContext<'_>) -> (&'static str, Resolution) {
    RESOLVE_RULES
        .iter()
        .find_map(|rule| (rule.evaluate)(ctx).map(|resolution| (rule.name, resolution)))
        .unwrap_or(("no_evidence", Resolution::Resolved(Category::Unknown)))
}

fn body_with_base_slot(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    (v.body_model > 0 && v.base_slot > 0).then_some(Resolution::Resolved(Category::Body))
}

fn sculpt_over_makeup(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    (v.face_model > 0 && v.face_paint > 0).then_some(Resolution::Resolved(Category::Face))
}

fn hair_with_loose_textures(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    let fires = v.hair > 0
        && v.uncategorized_textures > 0
        && v.hair >= v.ears_tails
        && v.hair >= v.gear
        && v.hair >= v.body();
    fires.then_some(Resolution::Resolved(Category::Hair))
}

fn framework_body(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    (ctx.name_is_body_framework && ctx.votes.body() >= 3)
        .then_some(Resolution::Resolved(Category::Body))
}

fn gear_dominant(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    let fires = v.gear >= 4 && v.gear > v.body() + v.tattoo && !ctx.name_is_body_framework;
    fires.then_some(Resolution::Resolved(Category::Gear))
}

/// Any creature path defers the package to its changed-item labels.
fn creature(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    (ctx.votes.creature > 0).then_some(Resolution::Creature)
}

fn animation(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    if !v.has_animation() {
        return None;
    }
    if v.idle_kinds() > 1 {
        return Some(Resolution::Resolved(Category::MixedIdle));
    }
    let mut best = (Category::Emote, 0usize);
    for (category, votes) in v.animation_votes() {
        if votes > best.1 {
            best = (category, votes);
        }
    }
    Some(Resolution::Resolved(best.0))
}

fn vfx(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    if v.vfx == 0 {
        return None;
    }
    if v.job_vfx_hits > 0 || ctx.name_has_job_keyword {
        Some(Resolution::Resolved(Category::JobVfx))
    } else {
        Some(Resolution::Resolved(Category::Vfx))
    }
}

fn highest_vote(ctx: &ResolveContext<'_>) -> Option<Resolution> {
    let v = ctx.votes;
    // Tie-break order.
    let candidates: [(Category, usize); 10] = [
        (Category::Body, v.body()),
        (Category::Gear, v.gear + v.base_slot),
        (Category::Hair, v.hair),
        (Category::Face, v.face_model),
        (Category::FacePaint, v.face_paint),
        (Category::Eyes, v.eyes),
        (Category::Tattoos, v.tattoo),
        (Category::EarsTails, v.ears_tails),
        (Category::Skeleton, v.skeleton),
        (Category::Other, v.other),
    ];

    let mut best: Option<(Category, usize)> = None;
    for (category, votes) in candidates {
        if votes == 0 {
            continue;
        }
        if best.map(|(_, b)| votes > b).unwrap_or(true) {
            best = Some((category, votes));
        }
    }

    match best {
        Some((category, _)) => Some(Resolution::Resolved(category)),
        None if v.uncategorized_textures > 0 => Some(Resolution::Resolved(Category::Other)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(path: &str) -> Evidence {
        evidence_for(&PathContext {
            path,
            name_has_tattoo: false,
        })
    }

    fn ctx(votes: &VoteTable) -> ResolveContext<'_> {
        ResolveContext {
            votes,
            name_is_body_framework: false,
            name_has_job_keyword: false,
        }
    }

    fn resolved(votes: &VoteTable) -> Resolution {
        resolve(&ctx(votes)).1
    }

    #[test]
    fn test_path_evidence() {
        assert_eq!(evidence("chara/human/c0101/skeleton/base/b0001/skl_c0101b0001.sklb"), Evidence::Skeleton);
        assert_eq!(evidence("chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl"), Evidence::Hair);
        assert_eq!(evidence("chara/human/c1801/obj/tail/t0001/model/c1801t0001_til.mdl"), Evidence::EarsTails);
        assert_eq!(evidence("chara/human/c0101/obj/face/f0001/model/c0101f0001_fac.mdl"), Evidence::FaceModel);
        assert_eq!(evidence("chara/human/c0101/obj/face/f0001/texture/--c0101f0001_fac_d.tex"), Evidence::FacePaint);
        assert_eq!(evidence("chara/human/c0101/obj/face/f0001/texture/--c0101f0001_iri_n.tex"), Evidence::Eyes);
        assert_eq!(evidence("chara/common/texture/decal_face/_decal_5.tex"), Evidence::FacePaint);
        assert_eq!(evidence("chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl"), Evidence::BodyModel);
        assert_eq!(evidence("chara/human/c0101/obj/body/b0001/texture/--c0101b0001_d.tex"), Evidence::BodySkin);
        assert_eq!(evidence("chara/equipment/e0000/model/c0101e0000_dwn.mdl"), Evidence::BaseSlot);
        assert_eq!(evidence("chara/equipment/e0100/model/c0101e0100_top.mdl"), Evidence::Gear);
        assert_eq!(evidence("chara/accessory/a0001/model/c0101a0001_ear.mdl"), Evidence::Gear);
        assert_eq!(evidence("chara/monster/m0001/obj/body/b0001/model/m0001b0001.mdl"), Evidence::Creature);
        assert_eq!(evidence("vfx/common/eff/cmrz_castx0c.avfx"), Evidence::Vfx);
        assert_eq!(evidence("ui/icon/000000/000001.tex"), Evidence::UncategorizedTexture);
        assert_eq!(evidence("sound/battle/se_x.scd"), Evidence::Other);
    }

    #[test]
    fn test_tattoo_name_turns_skin_into_tattoo() {
        let ctx = PathContext {
            path: "chara/human/c0101/obj/body/b0001/texture/--c0101b0001_d.tex",
            name_has_tattoo: true,
        };
        assert_eq!(evidence_for(&ctx), Evidence::Tattoo);
    }

    #[test]
    fn test_animation_evidence() {
        let base = "chara/human/c0101/animation/a0001/bt_common";
        assert_eq!(animation_evidence(&format!("{base}/emote/s_pose01_loop.pap")), Evidence::ChairSitting);
        assert_eq!(animation_evidence(&format!("{base}/emote/j_pose01_loop.pap")), Evidence::GroundSitting);
        assert_eq!(animation_evidence(&format!("{base}/emote/l_pose01_loop.pap")), Evidence::LyingDozing);
        assert_eq!(animation_evidence(&format!("{base}/emote/pose01_loop.pap")), Evidence::StandingIdle);
        assert_eq!(animation_evidence(&format!("{base}/resident/idle.pap")), Evidence::StandingIdle);
        assert_eq!(animation_evidence(&format!("{base}/resident/move_a.pap")), Evidence::Movement);
        assert_eq!(animation_evidence(&format!("{base}/emote/dance.pap")), Evidence::Emote);
    }

    #[test]
    fn test_rule_body_with_base_slot() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::BodyModel);
        votes.add(Evidence::BaseSlot);
        assert_eq!(resolve(&ctx(&votes)), ("body_with_base_slot", Resolution::Resolved(Category::Body)));
    }

    #[test]
    fn test_rule_sculpt_over_makeup() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::FaceModel);
        votes.add(Evidence::FacePaint);
        votes.add(Evidence::FacePaint);
        votes.add(Evidence::FacePaint);
        assert_eq!(resolve(&ctx(&votes)).0, "sculpt_over_makeup");
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::Face));
    }

    #[test]
    fn test_rule_hair_with_loose_textures() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::Hair);
        votes.add(Evidence::Hair);
        votes.add(Evidence::UncategorizedTexture);
        votes.add(Evidence::Gear);
        votes.add(Evidence::Gear);
        assert_eq!(resolve(&ctx(&votes)).0, "hair_with_loose_textures");

        // Gear outvotes hair: the rule declines.
        votes.add(Evidence::Gear);
        assert_ne!(resolve(&ctx(&votes)).0, "hair_with_loose_textures");
    }

    #[test]
    fn test_rule_framework_body_beats_gear() {
        let mut votes = VoteTable::default();
        for _ in 0..3 {
            votes.add(Evidence::BodySkin);
        }
        for _ in 0..6 {
            votes.add(Evidence::Gear);
        }
        let framework = ResolveContext {
            votes: &votes,
            name_is_body_framework: true,
            name_has_job_keyword: false,
        };
        assert_eq!(resolve(&framework), ("framework_body", Resolution::Resolved(Category::Body)));

        // Without the framework token gear dominates.
        assert_eq!(resolve(&ctx(&votes)), ("gear_dominant", Resolution::Resolved(Category::Gear)));
    }

    #[test]
    fn test_rule_gear_dominant_needs_four() {
        let mut votes = VoteTable::default();
        for _ in 0..3 {
            votes.add(Evidence::Gear);
        }
        assert_eq!(resolve(&ctx(&votes)).0, "highest_vote");
        votes.add(Evidence::Gear);
        assert_eq!(resolve(&ctx(&votes)).0, "gear_dominant");
    }

    #[test]
    fn test_rule_animation() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::ChairSitting);
        votes.add(Evidence::ChairSitting);
        votes.add(Evidence::Emote);
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::ChairSitting));

        votes.add(Evidence::LyingDozing);
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::MixedIdle));
    }

    #[test]
    fn test_rule_vfx() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::Vfx);
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::Vfx));
        votes.job_vfx_hits = 1;
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::JobVfx));
    }

    #[test]
    fn test_rule_highest_vote_and_creature() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::Creature);
        votes.add(Evidence::Creature);
        votes.add(Evidence::Other);
        votes.add(Evidence::Other);
        votes.add(Evidence::Other);
        assert_eq!(resolve(&ctx(&votes)), ("creature", Resolution::Creature));

        let mut votes = VoteTable::default();
        votes.add(Evidence::Eyes);
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::Eyes));
    }

    #[test]
    fn test_creature_beats_animation_and_vfx() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::Creature);
        votes.add(Evidence::StandingIdle);
        votes.add(Evidence::StandingIdle);
        votes.add(Evidence::Vfx);
        assert_eq!(resolve(&ctx(&votes)), ("creature", Resolution::Creature));
    }

    #[test]
    fn test_creature_paths_outrank_animation_and_vfx_paths() {
        assert_eq!(
            evidence("chara/monster/m0001/animation/a0001/bt_common/resident/idle.pap"),
            Evidence::Creature
        );
        assert_eq!(evidence("chara/monster/m0001/obj/body/b0001/vfx/eff/m0001_fire.avfx"), Evidence::Creature);
        assert_eq!(evidence("chara/demihuman/d1001/skeleton/base/b0001/skl_d1001b0001.sklb"), Evidence::Creature);
    }

    #[test]
    fn test_no_evidence_is_unknown() {
        let votes = VoteTable::default();
        assert_eq!(resolve(&ctx(&votes)), ("no_evidence", Resolution::Resolved(Category::Unknown)));
    }

    #[test]
    fn test_only_loose_textures_is_other() {
        let mut votes = VoteTable::default();
        votes.add(Evidence::UncategorizedTexture);
        assert_eq!(resolved(&votes), Resolution::Resolved(Category::Other));
    }
}
