//! Whitelist/blacklist gates. A pattern hits when the candidate text contains it.

use crate::config::{Patterns, PolicyTarget, SniffConfig};
use crate::style::cssom::StyleSheet;

/// Applies one whitelist/blacklist pair to `candidate`.
///
/// With a whitelist, the candidate must contain one of its patterns; a missing candidate
/// never passes a whitelist. With a blacklist, a candidate containing any of its patterns
/// is rejected; a missing candidate is never blacklisted.
pub fn is_allowed(
    candidate: Option<&str>,
    whitelist: Option<&Patterns>,
    blacklist: Option<&Patterns>,
) -> bool {
    let whitelisted =
        whitelist.map_or(true, |patterns| candidate.is_some_and(|c| patterns.matches(c)));
    let blacklisted =
        blacklist.is_some_and(|patterns| candidate.is_some_and(|c| patterns.matches(c)));
    whitelisted && !blacklisted
}

/// Sheets without an owner always pass. Owned sheets are judged by the owner's attributes
/// as JSON, and only `<style>`/`<link>` owners provide that text.
pub fn sheet_is_allowed(sheet: &StyleSheet, config: &SniffConfig) -> bool {
    let Some(owner) = &sheet.owner else {
        return true;
    };
    let candidate = (owner.tag.eq_ignore_ascii_case("style")
        || owner.tag.eq_ignore_ascii_case("link"))
    .then(|| owner.attributes_json());
    let (whitelist, blacklist) = config.policy(PolicyTarget::StyleSheet);
    is_allowed(candidate.as_deref(), whitelist, blacklist)
}

/// Gate for a grouping rule's condition text. An empty condition never passes.
pub fn media_is_allowed(condition_text: &str, config: &SniffConfig) -> bool {
    let (whitelist, blacklist) = config.policy(PolicyTarget::Media);
    !condition_text.is_empty() && is_allowed(Some(condition_text), whitelist, blacklist)
}

/// Gate for a style rule's raw selector text. An empty selector never passes.
pub fn rule_is_allowed(selector_text: &str, config: &SniffConfig) -> bool {
    let (whitelist, blacklist) = config.policy(PolicyTarget::Rule);
    !selector_text.is_empty() && is_allowed(Some(selector_text), whitelist, blacklist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::cssom::OwnerNode;

    fn owned_sheet(tag: &str, attributes: &[(&str, &str)]) -> StyleSheet {
        StyleSheet {
            owner: Some(OwnerNode {
                tag: tag.into(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_allowed_combinations() {
        let print = Patterns::from("print");
        assert!(is_allowed(Some("screen"), None, None));
        assert!(is_allowed(Some("print and (color)"), Some(&print), None));
        assert!(!is_allowed(Some("screen"), Some(&print), None));
        assert!(!is_allowed(Some("only print"), None, Some(&print)));
        assert!(!is_allowed(Some("print"), Some(&print), Some(&print)));
        assert!(!is_allowed(None, Some(&print), None));
        assert!(is_allowed(None, None, Some(&print)));
    }

    #[test]
    fn test_media_and_rule_gates() {
        let config = SniffConfig::default()
            .with_blacklist(PolicyTarget::Media, "print")
            .with_whitelist(PolicyTarget::Rule, ".keep");
        assert!(media_is_allowed("screen", &config));
        assert!(!media_is_allowed("print", &config));
        assert!(!media_is_allowed("", &SniffConfig::default()));
        assert!(rule_is_allowed("div .keep", &config));
        assert!(!rule_is_allowed("div", &config));
        assert!(!rule_is_allowed("", &SniffConfig::default()));
    }

    #[test]
    fn test_sheet_gate() {
        let config = SniffConfig::default().with_whitelist(PolicyTarget::StyleSheet, "main.css");
        assert!(sheet_is_allowed(&StyleSheet::default(), &config));
        assert!(sheet_is_allowed(
            &owned_sheet("link", &[("rel", "stylesheet"), ("href", "/css/main.css")]),
            &config
        ));
        assert!(!sheet_is_allowed(&owned_sheet("style", &[]), &config));
        assert!(!sheet_is_allowed(
            &owned_sheet("svg", &[("href", "main.css")]),
            &config
        ));

        let config = SniffConfig::default().with_blacklist(PolicyTarget::StyleSheet, "print");
        assert!(!sheet_is_allowed(&owned_sheet("style", &[("media", "print")]), &config));
        assert!(sheet_is_allowed(&owned_sheet("svg", &[("media", "print")]), &config));
    }
}
