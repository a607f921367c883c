//! Heuristic dependency detection.
//!
//! Only model-only gear packages are examined: they are the packages that
//! usually ship without their textures. Three name/description heuristics
//! run in order and each proposes at most one prerequisite:
//! 1. body-framework variant: strip the framework token and find the package
//!    the variant was made from;
//! 2. "models only" marker: strip the marker and find the package without it;
//! 3. declared: "requires/depends on/needs <name>" in the description.
//!
//! This is best-effort string matching. It can over- and under-detect.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::Category;
use crate::classifier::patterns;
use crate::entry::ModEntry;
use crate::identity::PackageIdentity;

/// Shortest residual name a heuristic will search for.
const MIN_RESIDUAL_LEN: usize = 3;

static MODELS_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\[\(\{]?\s*\bmodels?[\s_\-]*only\b\s*[\]\)\}]?").expect("valid models-only regex")
});

static REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:requires|required|depends\s+on|needs)\b[\s:]*").expect("valid requirement regex")
});

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:"([^"]+)"|'([^']+)'|\[([^\]]+)\]|“([^”]+)”)"#).expect("valid quoted-name regex")
});

/// Which heuristic produced a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Body-framework variant of another package.
    BodyBase,
    /// Model-only half of a package whose textures ship separately.
    ModelTextures,
    /// Named in the package description.
    Declared,
}

/// A proposed "requires" edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub required: PackageIdentity,
    /// The target exists in the current inventory.
    pub found: bool,
    pub kind: DependencyKind,
}

/// One candidate target, pre-normalized.
struct IndexedName {
    index: usize,
    /// Name tokens joined by single spaces.
    normalized: String,
    has_models_only_marker: bool,
}

/// Dependency detector over one inventory snapshot.
pub struct DependencyDetector<'a> {
    entries: &'a [ModEntry],
    names: Vec<IndexedName>,
    body_tokens: Vec<String>,
}

impl<'a> DependencyDetector<'a> {
    pub fn new(entries: &'a [ModEntry], body_tokens: Vec<String>) -> Self {
        let names = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| IndexedName {
                index,
                normalized: normalized_name(entry.display_name()),
                has_models_only_marker: MODELS_ONLY_RE.is_match(entry.display_name()),
            })
            .collect();
        Self {
            entries,
            names,
            body_tokens,
        }
    }

    /// Returns true if the entry is eligible for detection at all.
    pub fn applies_to(entry: &ModEntry) -> bool {
        entry.category == Category::Gear && entry.flags.model_only
    }

    /// Dependencies of `entry`, in heuristic order, one per target.
    pub fn detect(&self, entry: &ModEntry) -> Vec<Dependency> {
        if !Self::applies_to(entry) {
            return Vec::new();
        }

        let candidates = [
            self.body_base(entry),
            self.model_textures(entry),
            self.declared(entry),
        ];

        let mut found: Vec<Dependency> = Vec::new();
        for dependency in candidates.into_iter().flatten() {
            let duplicate = found.iter().any(|d| {
                d.required == dependency.required
                    && (!d.required.directory_id.is_empty()
                        || d.required.display_name == dependency.required.display_name)
            });
            if !duplicate {
                found.push(dependency);
            }
        }

        if !found.is_empty() {
            debug!("{} depends on {} package(s)", entry.identity, found.len());
        }
        found
    }

    fn body_base(&self, entry: &ModEntry) -> Option<Dependency> {
        // Body tokens are usually written as tags ("Top [YAB]"); the residual
        // drops every bracketed tag, creator names included.
        let all_tokens = patterns::name_tokens(entry.display_name());
        if !all_tokens.iter().any(|t| self.is_body_token(t)) {
            return None;
        }

        let tokens = patterns::name_tokens(&patterns::strip_bracketed(entry.display_name()));
        let residual: Vec<&str> = tokens
            .iter()
            .filter(|t| !self.is_body_token(t))
            .filter(|t| !patterns::is_version_token(t))
            .filter(|t| !patterns::BODY_NAME_FILLER.contains(&t.as_str()))
            .map(|t| t.as_str())
            .collect();
        let residual = residual.join(" ");

        self.find_containing(entry, &residual, |_| true)
            .map(|target| self.dependency(target, DependencyKind::BodyBase))
    }

    fn model_textures(&self, entry: &ModEntry) -> Option<Dependency> {
        if !MODELS_ONLY_RE.is_match(entry.display_name()) {
            return None;
        }
        let stripped = MODELS_ONLY_RE.replace_all(entry.display_name(), " ");
        let residual = normalized_name(&stripped);

        self.find_containing(entry, &residual, |candidate| !candidate.has_models_only_marker)
            .map(|target| self.dependency(target, DependencyKind::ModelTextures))
    }

    fn declared(&self, entry: &ModEntry) -> Option<Dependency> {
        if entry.description.is_empty() {
            return None;
        }

        for phrase in REQUIREMENT_RE.find_iter(&entry.description) {
            let tail = entry.description[phrase.end()..].trim_start();
            if tail.is_empty() {
                continue;
            }

            if let Some(target) = self.longest_prefix_name(entry, tail) {
                return Some(self.dependency(target, DependencyKind::Declared));
            }

            if let Some(name) = quoted_name(tail) {
                return Some(Dependency {
                    required: PackageIdentity::new(String::new(), name),
                    found: false,
                    kind: DependencyKind::Declared,
                });
            }
        }
        None
    }

    /// First other entry whose normalized name contains `residual`.
    ///
    /// Texture-only candidates are preferred.
    fn find_containing<F>(&self, entry: &ModEntry, residual: &str, accept: F) -> Option<usize>
    where
        F: Fn(&IndexedName) -> bool,
    {
        if residual.len() < MIN_RESIDUAL_LEN {
            return None;
        }

        let mut matches = self.names.iter().filter(|candidate| {
            self.entries[candidate.index].identity != entry.identity
                && candidate.normalized.contains(residual)
                && accept(candidate)
        });

        let first = matches.next()?;
        if self.entries[first.index].flags.texture_only {
            return Some(first.index);
        }
        Some(
            matches
                .find(|candidate| self.entries[candidate.index].flags.texture_only)
                .map(|candidate| candidate.index)
                .unwrap_or(first.index),
        )
    }

    /// Longest other entry name that `text` starts with (case-insensitive).
    fn longest_prefix_name(&self, entry: &ModEntry, text: &str) -> Option<usize> {
        let text = text.to_lowercase();
        let text = text.trim_start_matches(['"', '\'', '[', '“']);

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, other)| other.identity != entry.identity)
            .filter_map(|(index, other)| {
                let name = other.display_name().trim().to_lowercase();
                if name.len() < MIN_RESIDUAL_LEN || !text.starts_with(&name) {
                    return None;
                }
                // Must end on a word boundary.
                let next = text[name.len()..].chars().next();
                match next {
                    Some(c) if c.is_alphanumeric() => None,
                    _ => Some((index, name.len())),
                }
            })
            .max_by_key(|(_, len)| *len)
            .map(|(index, _)| index)
    }

    fn is_body_token(&self, token: &str) -> bool {
        self.body_tokens.iter().any(|b| b == token)
    }

    fn dependency(&self, index: usize, kind: DependencyKind) -> Dependency {
        Dependency {
            required: self.entries[index].identity.clone(),
            found: true,
            kind,
        }
    }
}

/// Name tokens joined by single spaces.
fn normalized_name(name: &str) -> String {
    patterns::name_tokens(name).join(" ")
}

fn quoted_name(text: &str) -> Option<String> {
    let captures = QUOTED_RE.captures(text)?;
    captures
        .iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
