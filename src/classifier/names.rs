//! Name-only classification, used when a package exposes no game paths.
//!
//! Deliberately narrow: a name has to be unambiguous to get a category.
//! Anything else is `Unknown`.

use super::patterns;
use crate::category::Category;

/// Classify from the display name alone.
///
/// `extra_body_tokens` extends the built-in framework token list.
pub fn classify_name(name: &str, extra_body_tokens: &[String]) -> Category {
    let stripped = patterns::strip_bracketed(name);
    let tokens: Vec<String> = patterns::name_tokens(&stripped)
        .into_iter()
        .filter(|t| !patterns::is_version_token(t))
        .collect();

    if tokens.is_empty() {
        return Category::Unknown;
    }

    if is_bare_body_name(&tokens, extra_body_tokens) {
        return Category::Body;
    }

    if patterns::has_any_token(&tokens, patterns::HAIR_NAME_TOKENS) {
        return Category::Hair;
    }

    if patterns::has_any_token(&tokens, patterns::VFX_NAME_TOKENS) {
        let with_pairs = patterns::tokens_with_pairs(&tokens);
        if patterns::has_any_token(&with_pairs, patterns::JOB_KEYWORDS) {
            return Category::JobVfx;
        }
        return Category::Vfx;
    }

    if patterns::has_any_token(&tokens, patterns::EMOTE_NAME_TOKENS) {
        return Category::Emote;
    }

    if patterns::has_any_token(&tokens, patterns::IDLE_NAME_TOKENS) {
        return Category::StandingIdle;
    }

    Category::Unknown
}

/// A name that is nothing but a body framework (plus filler words), or one
/// of the known full body-mod names.
fn is_bare_body_name(tokens: &[String], extra_body_tokens: &[String]) -> bool {
    let joined = tokens.join(" ");
    if patterns::KNOWN_BODY_NAMES.contains(&joined.as_str()) {
        return true;
    }

    let residual: Vec<&String> = tokens
        .iter()
        .filter(|t| !patterns::BODY_NAME_FILLER.contains(&t.as_str()))
        .collect();

    match residual.as_slice() {
        [only] => {
            patterns::BODY_FRAMEWORK_TOKENS.contains(&only.as_str())
                || extra_body_tokens.iter().any(|extra| extra == *only)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> Category {
        classify_name(name, &[])
    }

    #[test]
    fn test_bare_body_names() {
        assert_eq!(classify("YAB"), Category::Body);
        assert_eq!(classify("Bibo+ Body"), Category::Body);
        assert_eq!(classify("[Author] TBSE v2"), Category::Body);
        assert_eq!(classify("The Body SE"), Category::Body);
        assert_eq!(classify("Tight & Firm"), Category::Body);
    }

    #[test]
    fn test_body_token_in_longer_name_is_unknown() {
        assert_eq!(classify("[Koko] Jacket YAB"), Category::Unknown);
        assert_eq!(classify("Bibo Lace Top"), Category::Unknown);
    }

    #[test]
    fn test_extra_body_tokens() {
        let extra = vec!["lavabod".to_string()];
        assert_eq!(classify_name("Lavabod", &extra), Category::Body);
        assert_eq!(classify("Lavabod"), Category::Unknown);
    }

    #[test]
    fn test_hair_token_boundaries() {
        assert_eq!(classify("Wavy Hair"), Category::Hair);
        assert_eq!(classify("Hairpin Set"), Category::Unknown);
        assert_eq!(classify("Chair Sit"), Category::Unknown);
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(classify("Sparkle VFX"), Category::Vfx);
        assert_eq!(classify("Dark Knight Effects"), Category::JobVfx);
        assert_eq!(classify("Cute Emote Pack"), Category::Emote);
        assert_eq!(classify("Elegant Idle"), Category::StandingIdle);
    }

    #[test]
    fn test_empty_or_decorations_only() {
        assert_eq!(classify(""), Category::Unknown);
        assert_eq!(classify("[WIP] (v3)"), Category::Unknown);
    }
}
