//! Package classifier.
//!
//! Turns a package's game paths and display name into one [`Category`]:
//! - an override always wins;
//! - with no paths, a narrow name-only rule set applies (`names`);
//! - otherwise every path casts one vote (`rules::PATH_RULES`) and the vote
//!   table is resolved by the precedence chain in `rules::RESOLVE_RULES`.
//!
//! Classification is a pure function of its inputs.

mod names;
pub mod patterns;
pub mod rules;
mod votes;

pub use names::classify_name;
pub use votes::{Evidence, VoteTable};

use crate::category::Category;
use rules::{PathContext, Resolution, ResolveContext};

/// Bumped whenever a rule change can move a package to another category.
pub const RULES_REVISION: u32 = 2;

/// Changed-item label suffix marking a mount.
pub const MOUNT_LABEL: &str = "(mount)";

/// Changed-item label suffixes marking a minion.
pub const MINION_LABELS: &[&str] = &["(companion)", "(minion)"];

/// Everything the classifier looks at for one package.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub name: &'a str,
    /// Normalized game paths.
    pub paths: &'a [String],
    pub override_category: Option<Category>,
    /// Provider's changed-item labels; only consulted for creature packages.
    pub changed_items: &'a [String],
}

impl<'a> ClassifyInput<'a> {
    pub fn new(name: &'a str, paths: &'a [String]) -> Self {
        Self {
            name,
            paths,
            override_category: None,
            changed_items: &[],
        }
    }

    pub fn with_override(mut self, category: Option<Category>) -> Self {
        self.override_category = category;
        self
    }

    pub fn with_changed_items(mut self, labels: &'a [String]) -> Self {
        self.changed_items = labels;
        self
    }
}

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Override,
    /// Path votes, resolved by the named rule.
    Paths(&'static str),
    Name,
}

/// A category plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub source: ClassificationSource,
    pub votes: VoteTable,
}

/// Classifies packages by their game paths and names.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    /// Additional body-framework name tokens, lowercase.
    extra_body_tokens: Vec<String>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add body-framework tokens on top of the built-in list.
    pub fn with_body_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_body_tokens.extend(
            tokens
                .into_iter()
                .map(|t| patterns::normalize_name(t.as_ref()))
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn classify(&self, input: &ClassifyInput<'_>) -> Category {
        self.classify_detailed(input).category
    }

    pub fn classify_detailed(&self, input: &ClassifyInput<'_>) -> Classification {
        if let Some(category) = input.override_category {
            return Classification {
                category,
                source: ClassificationSource::Override,
                votes: VoteTable::default(),
            };
        }

        if input.paths.is_empty() {
            return Classification {
                category: classify_name(input.name, &self.extra_body_tokens),
                source: ClassificationSource::Name,
                votes: VoteTable::default(),
            };
        }

        let name_tokens = patterns::name_tokens(input.name);
        let votes = self.count_votes(input.paths, &name_tokens);
        let name_with_pairs = patterns::tokens_with_pairs(&name_tokens);

        let ctx = ResolveContext {
            votes: &votes,
            name_is_body_framework: self.is_body_framework_name(&name_tokens),
            name_has_job_keyword: patterns::has_any_token(&name_with_pairs, patterns::JOB_KEYWORDS),
        };
        let (rule, resolution) = rules::resolve(&ctx);

        let category = match resolution {
            Resolution::Resolved(category) => category,
            Resolution::Creature => creature_category(input.changed_items),
        };

        Classification {
            category,
            source: ClassificationSource::Paths(rule),
            votes,
        }
    }

    /// Cast one vote per path.
    pub fn count_votes(&self, paths: &[String], name_tokens: &[String]) -> VoteTable {
        let name_has_tattoo = patterns::has_any_token(name_tokens, patterns::TATTOO_KEYWORDS);
        let mut votes = VoteTable::default();
        for path in paths {
            let ctx = PathContext {
                path,
                name_has_tattoo,
            };
            let evidence = rules::evidence_for(&ctx);
            if evidence == Evidence::Vfx && patterns::is_job_vfx_path(path) {
                votes.job_vfx_hits += 1;
            }
            votes.add(evidence);
        }
        votes
    }

    /// Returns true if any name token is a body-framework identifier.
    pub fn is_body_framework_name(&self, name_tokens: &[String]) -> bool {
        patterns::has_any_token(name_tokens, patterns::BODY_FRAMEWORK_TOKENS)
            || name_tokens
                .iter()
                .any(|t| self.extra_body_tokens.iter().any(|extra| extra == t))
    }

    /// Identifies the rule revision and body tokens this classifier uses.
    ///
    /// Cached categories are only valid under the fingerprint they were
    /// computed with.
    pub fn fingerprint(&self) -> String {
        let mut tokens = self.body_tokens();
        tokens.sort();
        tokens.dedup();
        format!("rules-{}:{}", RULES_REVISION, tokens.join(","))
    }

    /// Body-framework tokens in effect, built-in first.
    pub fn body_tokens(&self) -> Vec<String> {
        patterns::BODY_FRAMEWORK_TOKENS
            .iter()
            .map(|t| t.to_string())
            .chain(self.extra_body_tokens.iter().cloned())
            .collect()
    }
}

/// Mount/Minion from changed-item labels; `Other` when no label says which.
pub fn creature_category(labels: &[String]) -> Category {
    let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    if lowered.iter().any(|l| l.contains(MOUNT_LABEL)) {
        Category::Mount
    } else if lowered
        .iter()
        .any(|l| MINION_LABELS.iter().any(|m| l.contains(m)))
    {
        Category::Minion
    } else {
        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_body_with_base_slot() {
        let paths = paths(&[
            "chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl",
            "chara/equipment/e0000/model/c0101e0000_dwn.mdl",
        ]);
        let result = Classifier::new().classify_detailed(&ClassifyInput::new("Some Body", &paths));
        assert_eq!(result.category, Category::Body);
        assert_eq!(result.source, ClassificationSource::Paths("body_with_base_slot"));
    }

    #[test]
    fn test_hair_package() {
        let paths = paths(&["chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl"]);
        let category = Classifier::new().classify(&ClassifyInput::new("Wavy Bob", &paths));
        assert_eq!(category, Category::Hair);
    }

    #[test]
    fn test_name_only_fallback() {
        let classifier = Classifier::new();
        let none: Vec<String> = Vec::new();
        let result = classifier.classify_detailed(&ClassifyInput::new("[Koko] Jacket YAB", &none));
        assert_eq!(result.category, Category::Unknown);
        assert_eq!(result.source, ClassificationSource::Name);

        assert_eq!(classifier.classify(&ClassifyInput::new("YAB", &none)), Category::Body);
    }

    #[test]
    fn test_override_wins_over_paths() {
        let paths = paths(&["chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl"]);
        let classifier = Classifier::new();
        let input = ClassifyInput::new("Wavy Bob", &paths).with_override(Some(Category::Gear));
        let result = classifier.classify_detailed(&input);
        assert_eq!(result.category, Category::Gear);
        assert_eq!(result.source, ClassificationSource::Override);

        let cleared = input.with_override(None);
        assert_eq!(classifier.classify(&cleared), Category::Hair);
    }

    #[test]
    fn test_deterministic() {
        let paths = paths(&[
            "chara/equipment/e0100/model/c0101e0100_top.mdl",
            "chara/equipment/e0100/texture/v01_c0101e0100_top_d.tex",
            "chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl",
        ]);
        let classifier = Classifier::new();
        let input = ClassifyInput::new("Outfit", &paths);
        let first = classifier.classify_detailed(&input);
        for _ in 0..10 {
            assert_eq!(classifier.classify_detailed(&input), first);
        }
    }

    #[test]
    fn test_framework_name_keeps_body() {
        let paths = paths(&[
            "chara/human/c0201/obj/body/b0001/model/c0201b0001.mdl",
            "chara/human/c0201/obj/body/b0001/texture/--c0201b0001_d.tex",
            "chara/human/c0201/obj/body/b0001/texture/--c0201b0001_n.tex",
            "chara/equipment/e0100/model/c0201e0100_top.mdl",
            "chara/equipment/e0101/model/c0201e0101_top.mdl",
            "chara/equipment/e0102/model/c0201e0102_top.mdl",
            "chara/equipment/e0103/model/c0201e0103_top.mdl",
            "chara/equipment/e0104/model/c0201e0104_top.mdl",
        ]);
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(&ClassifyInput::new("Bibo+ Pack", &paths)), Category::Body);
        assert_eq!(classifier.classify(&ClassifyInput::new("Pack", &paths)), Category::Gear);
    }

    #[test]
    fn test_job_vfx_by_path_and_name() {
        let classifier = Classifier::new();
        let ws = paths(&["vfx/ws/bt_2sw_a/eff/ws_b_sw.avfx"]);
        assert_eq!(classifier.classify(&ClassifyInput::new("Sparkles", &ws)), Category::JobVfx);

        let common = paths(&["vfx/common/eff/cmrz_castx0c.avfx"]);
        assert_eq!(classifier.classify(&ClassifyInput::new("Sparkles", &common)), Category::Vfx);
        assert_eq!(
            classifier.classify(&ClassifyInput::new("Reaper Sparkles", &common)),
            Category::JobVfx
        );
    }

    #[test]
    fn test_tattoo_name() {
        let paths = paths(&["chara/human/c0101/obj/body/b0001/texture/--c0101b0001_d.tex"]);
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(&ClassifyInput::new("Sleeve Tattoo", &paths)), Category::Tattoos);
        assert_eq!(classifier.classify(&ClassifyInput::new("Tan Lines", &paths)), Category::Body);
    }

    #[test]
    fn test_creature_labels() {
        let paths = paths(&["chara/monster/m0001/obj/body/b0001/model/m0001b0001.mdl"]);
        let classifier = Classifier::new();

        let mount = vec!["Company Chocobo (Mount)".to_string()];
        let input = ClassifyInput::new("Chocobo Retexture", &paths).with_changed_items(&mount);
        assert_eq!(classifier.classify(&input), Category::Mount);

        let minion = vec!["Wind-up Cursor (Companion)".to_string()];
        let input = ClassifyInput::new("Cursor", &paths).with_changed_items(&minion);
        assert_eq!(classifier.classify(&input), Category::Minion);

        let input = ClassifyInput::new("Monster", &paths);
        assert_eq!(classifier.classify(&input), Category::Other);
    }

    #[test]
    fn test_mount_with_animation_uses_labels() {
        let paths = paths(&[
            "chara/monster/m0001/obj/body/b0001/model/m0001b0001.mdl",
            "chara/monster/m0001/obj/body/b0001/texture/v01_m0001b0001_d.tex",
            "chara/monster/m0001/animation/a0001/bt_common/resident/idle.pap",
        ]);
        let mount = vec!["Company Chocobo (Mount)".to_string()];
        let input = ClassifyInput::new("Chocobo Idle", &paths).with_changed_items(&mount);

        let result = Classifier::new().classify_detailed(&input);
        assert_eq!(result.category, Category::Mount);
        assert_eq!(result.source, ClassificationSource::Paths("creature"));
    }

    #[test]
    fn test_extra_body_tokens() {
        let classifier = Classifier::new().with_body_tokens(["Lavabod"]);
        assert!(classifier.is_body_framework_name(&["lavabod".to_string()]));
        assert!(classifier.body_tokens().contains(&"lavabod".to_string()));
    }

    #[test]
    fn test_fingerprint_tracks_body_tokens() {
        let plain = Classifier::new();
        let extra = Classifier::new().with_body_tokens(["Lavabod"]);
        assert_ne!(plain.fingerprint(), extra.fingerprint());
        assert_eq!(extra.fingerprint(), Classifier::new().with_body_tokens(["lavabod"]).fingerprint());
        // Repeating a built-in token changes nothing.
        assert_eq!(plain.fingerprint(), Classifier::new().with_body_tokens(["YAB"]).fingerprint());
    }

    #[test]
    fn test_exactly_one_category() {
        let paths = paths(&["ui/icon/000000/000001.tex"]);
        let category = Classifier::new().classify(&ClassifyInput::new("Icons", &paths));
        assert_eq!(category, Category::Other);
        assert_ne!(category, Category::Unknown);
    }
}
