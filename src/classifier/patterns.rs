//! Detection patterns for classification.
//!
//! Game-path conventions and package-name tokens. Paths passed to the path
//! predicates are expected to be normalized (see `paths::normalize_game_path`).

use unicode_normalization::UnicodeNormalization;

use crate::paths;

/// Body-replacement framework identifiers, as name tokens.
pub const BODY_FRAMEWORK_TOKENS: &[&str] = &[
    "bibo",
    "biboplus",
    "gen2",
    "gen3",
    "tbse",
    "yab",
    "rue",
    "otopop",
    "skelomae",
    "hrbody",
];

/// Full body-mod names matched after decorations are stripped.
pub const KNOWN_BODY_NAMES: &[&str] = &[
    "the body",
    "the body se",
    "yet another body",
    "tight and firm",
    "tight firm",
];

/// Tokens dropped when checking whether a name is a bare body-mod name.
pub const BODY_NAME_FILLER: &[&str] = &[
    "body", "base", "mod", "for", "the", "se", "update", "updated", "fixed", "fix", "edit",
];

/// Name tokens marking tattoo and skin-overlay packages.
pub const TATTOO_KEYWORDS: &[&str] = &[
    "tattoo", "tattoos", "tat", "tats", "ink", "scar", "scars", "freckles", "freckle",
    "overlay", "overlays", "marking", "markings", "birthmark",
];

/// Job names and abbreviations that mark job-specific effects.
pub const JOB_KEYWORDS: &[&str] = &[
    "paladin", "pld", "warrior", "war", "darkknight", "drk", "gunbreaker", "gnb",
    "whitemage", "whm", "scholar", "sch", "astrologian", "ast", "sage", "sge",
    "monk", "mnk", "dragoon", "drg", "ninja", "nin", "samurai", "sam", "reaper", "rpr",
    "viper", "vpr", "bard", "brd", "machinist", "mch", "dancer", "dnc",
    "blackmage", "blm", "summoner", "smn", "redmage", "rdm", "pictomancer", "pct",
    "bluemage", "blu",
];

/// Directories under `vfx/` that only hold action effects.
pub const JOB_VFX_DIRECTORIES: &[&str] = &["ws", "abl", "mgc", "lb", "limitbreak"];

/// Name tokens for the conservative name-only hair rule.
pub const HAIR_NAME_TOKENS: &[&str] = &["hair", "hairs", "hairstyle", "hairstyles"];

/// Name tokens for the conservative name-only emote rule.
pub const EMOTE_NAME_TOKENS: &[&str] = &["emote", "emotes", "animation", "animations", "anim", "dance"];

/// Name tokens for the conservative name-only idle rule.
pub const IDLE_NAME_TOKENS: &[&str] = &["idle", "idles"];

/// Name tokens for the conservative name-only VFX rule.
pub const VFX_NAME_TOKENS: &[&str] = &["vfx", "effect", "effects"];

/// Skeleton and bone-deformer extensions.
pub const SKELETON_EXTENSIONS: &[&str] = &["sklb", "skp", "pbd"];

/// Animation and timeline extensions.
pub const ANIMATION_EXTENSIONS: &[&str] = &["pap", "tmb"];

/// Visual-effect extensions.
pub const VFX_EXTENSIONS: &[&str] = &["avfx", "atex"];

/// Path prefixes of creature models (mounts, minions, demihumans).
pub const CREATURE_PREFIXES: &[&str] = &["chara/monster/", "chara/demihuman/"];

/// Path prefixes of equipment, accessories, and weapons.
pub const GEAR_PREFIXES: &[&str] = &["chara/equipment/", "chara/accessory/", "chara/weapon/"];

/// Equipment set that holds the base-slot ("smallclothes") models.
pub const BASE_SLOT_PREFIX: &str = "chara/equipment/e0000/";

/// Shared face-decal textures.
pub const FACE_DECAL_PREFIX: &str = "chara/common/texture/decal_face/";

/// Shared eye textures.
pub const EYE_TEXTURE_PREFIXES: &[&str] = &["chara/common/texture/eye/", "chara/common/texture/iris/"];

/// Shared skin textures.
pub const SKIN_TEXTURE_PREFIXES: &[&str] = &["chara/common/texture/skin", "chara/skin/"];

/// Filename tokens, checked in order, for the idle/pose sub-categories.
pub const CHAIR_SIT_TOKENS: &[&str] = &["s_pose", "chair"];
pub const GROUND_SIT_TOKENS: &[&str] = &["j_pose", "jmn_pose", "groundsit"];
pub const LYING_TOKENS: &[&str] = &["l_pose", "doze", "sleep"];
pub const STANDING_IDLE_TOKENS: &[&str] = &["pose", "idle"];
pub const MOVEMENT_TOKENS: &[&str] = &["move", "walk", "run", "jmp", "jump", "sprint", "fall", "turn"];

/// Normalize a display name: NFKC, lowercase, `+` spelled out.
pub fn normalize_name(name: &str) -> String {
    name.nfkc()
        .collect::<String>()
        .to_lowercase()
        .replace('+', "plus")
}

/// Split a name into lowercase alphanumeric tokens.
pub fn name_tokens(name: &str) -> Vec<String> {
    normalize_name(name)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Tokens plus adjacent-pair concatenations ("dark knight" -> "darkknight").
pub fn tokens_with_pairs(tokens: &[String]) -> Vec<String> {
    let mut out = tokens.to_vec();
    for pair in tokens.windows(2) {
        out.push(format!("{}{}", pair[0], pair[1]));
    }
    out
}

/// Remove bracketed decorations (`[Tag]`, `(v2)`, `{x}`) from a name.
pub fn strip_bracketed(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for ch in name.chars() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Returns true if the token looks like a version marker (`v2`, `1`, `2024`).
pub fn is_version_token(token: &str) -> bool {
    let digits = token.strip_prefix('v').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Returns true if any token is in `list`.
pub fn has_any_token(tokens: &[String], list: &[&str]) -> bool {
    tokens.iter().any(|t| list.contains(&t.as_str()))
}

/// Returns true if the path is under one of the creature directories.
pub fn is_creature_path(path: &str) -> bool {
    CREATURE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Returns true if the path is under an equipment/accessory/weapon directory.
pub fn is_gear_path(path: &str) -> bool {
    GEAR_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Returns true if the path is a base-slot ("smallclothes") file.
pub fn is_base_slot_path(path: &str) -> bool {
    path.starts_with(BASE_SLOT_PREFIX)
}

/// Returns true if the path is under `chara/human/<race>/obj/<part>/`.
pub fn is_human_part(path: &str, part: &str) -> bool {
    path.starts_with("chara/human/") && paths::segment_after(path, "obj") == Some(part)
}

/// Returns true if the path is an iris/eye texture.
pub fn is_eye_path(path: &str) -> bool {
    let name = paths::file_name(path);
    name.contains("_iri_")
        || name.contains("_iris")
        || EYE_TEXTURE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Returns true if the path is a shared face-decal texture.
pub fn is_face_decal_path(path: &str) -> bool {
    path.starts_with(FACE_DECAL_PREFIX)
}

/// Returns true if the path is a shared skin texture or sits under a
/// body-framework directory (`chara/bibo/...`).
pub fn is_skin_texture_path(path: &str) -> bool {
    if SKIN_TEXTURE_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }
    path.starts_with("chara/")
        && paths::segments(path)
            .take(3)
            .any(|seg| BODY_FRAMEWORK_TOKENS.contains(&seg))
}

/// Returns true if the extension is in `list` (case-insensitive).
pub fn has_extension(path: &str, list: &[&str]) -> bool {
    paths::extension(path)
        .map(|ext| list.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Returns true if the path is an animation file or sits in an animation tree.
pub fn is_animation_path(path: &str) -> bool {
    has_extension(path, ANIMATION_EXTENSIONS)
        || (path.starts_with("chara/") && paths::has_segment(path, "animation"))
}

/// Returns true if the path is a visual effect.
pub fn is_vfx_path(path: &str) -> bool {
    path.starts_with("vfx/") || has_extension(path, VFX_EXTENSIONS)
}

/// Returns true if a VFX path belongs to a job action.
pub fn is_job_vfx_path(path: &str) -> bool {
    if let Some(dir) = path.strip_prefix("vfx/").and_then(|rest| rest.split('/').next()) {
        if JOB_VFX_DIRECTORIES.contains(&dir) {
            return true;
        }
    }
    let tokens: Vec<String> = path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    has_any_token(&tokens, JOB_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_tokens() {
        assert_eq!(name_tokens("[Koko] Jacket YAB"), vec!["koko", "jacket", "yab"]);
        assert_eq!(name_tokens("Bibo+ Body"), vec!["biboplus", "body"]);
        assert_eq!(name_tokens("ＹＡＢ"), vec!["yab"]);
    }

    #[test]
    fn test_tokens_with_pairs() {
        let tokens = name_tokens("Dark Knight Shadows");
        let all = tokens_with_pairs(&tokens);
        assert!(all.contains(&"darkknight".to_string()));
        assert!(has_any_token(&all, JOB_KEYWORDS));
    }

    #[test]
    fn test_strip_bracketed() {
        assert_eq!(strip_bracketed("[Koko] Jacket (v2) YAB").trim(), "Jacket  YAB");
        assert_eq!(strip_bracketed("Plain"), "Plain");
    }

    #[test]
    fn test_version_token() {
        assert!(is_version_token("v2"));
        assert!(is_version_token("2024"));
        assert!(!is_version_token("v"));
        assert!(!is_version_token("yab"));
    }

    #[test]
    fn test_human_part() {
        assert!(is_human_part("chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl", "hair"));
        assert!(is_human_part("chara/human/c1801/obj/zear/z0001/model/c1801z0001_zer.mdl", "zear"));
        assert!(!is_human_part("chara/equipment/e0100/model/c0101e0100_top.mdl", "body"));
    }

    #[test]
    fn test_gear_and_base_slot() {
        assert!(is_gear_path("chara/equipment/e0100/model/c0101e0100_top.mdl"));
        assert!(is_gear_path("chara/accessory/a0001/model/c0101a0001_ear.mdl"));
        assert!(is_base_slot_path("chara/equipment/e0000/model/c0101e0000_dwn.mdl"));
        assert!(!is_base_slot_path("chara/equipment/e0100/model/c0101e0100_dwn.mdl"));
    }

    #[test]
    fn test_eye_and_face_decal() {
        assert!(is_eye_path("chara/human/c0101/obj/face/f0001/texture/--c0101f0001_iri_n.tex"));
        assert!(is_eye_path("chara/common/texture/eye/eye01_base.tex"));
        assert!(is_face_decal_path("chara/common/texture/decal_face/_decal_5.tex"));
        assert!(!is_eye_path("chara/human/c0101/obj/face/f0001/texture/--c0101f0001_fac_d.tex"));
    }

    #[test]
    fn test_skin_texture() {
        assert!(is_skin_texture_path("chara/bibo/midlander_d.tex"));
        assert!(is_skin_texture_path("chara/common/texture/skin_m.tex"));
        assert!(!is_skin_texture_path("chara/equipment/e0100/texture/v01_c0101e0100_top_d.tex"));
    }

    #[test]
    fn test_vfx_paths() {
        assert!(is_vfx_path("vfx/common/eff/cmrz_castx0c.avfx"));
        assert!(is_vfx_path("chara/weapon/w0101/obj/body/b0001/vfx/eff/vw0001.avfx"));
        assert!(is_job_vfx_path("vfx/ws/bt_2sw_a/eff/ws_b_sw.avfx"));
        assert!(is_job_vfx_path("vfx/common/eff/drk_shadow.avfx"));
        assert!(!is_job_vfx_path("vfx/common/eff/cmrz_castx0c.avfx"));
    }

    #[test]
    fn test_animation_paths() {
        assert!(is_animation_path("chara/human/c0101/animation/a0001/bt_common/emote/s_pose01_loop.pap"));
        assert!(is_animation_path("chara/action/emote/dance.tmb"));
        assert!(!is_animation_path("chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl"));
    }

    #[test]
    fn test_creature_paths() {
        assert!(is_creature_path("chara/monster/m0001/obj/body/b0001/model/m0001b0001.mdl"));
        assert!(is_creature_path("chara/demihuman/d1001/obj/equipment/e0001/model/d1001e0001_top.mdl"));
        assert!(!is_creature_path("chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl"));
    }
}
