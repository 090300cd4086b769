use crate::config::SniffConfig;
use crate::sniff::host::{MatchOutcome, SelectorMatcher};
use crate::sniff::matched::{ConditionalGroup, RuleMap, RuleMatch, SimpleMatch};
use crate::sniff::normalize::test_selector;
use crate::sniff::policy;
use crate::sniff::split::split_selectors;
use crate::style::css_matcher::SelectorError;
use crate::style::cssom::CssRule;

/// Matches one element against a rule list, adding to `matched`.
///
/// `matched` holds what earlier elements already matched in this list; a selector that
/// is already recorded for a rule is not added twice. Nested grouping rules deliberately
/// continue from the group recorded at the same index, if any, instead of starting
/// empty, so a group accumulates across elements the same way a top-level rule does.
/// Returns `None` if nothing in the list has matched so far.
pub fn match_rules<M: SelectorMatcher + ?Sized>(
    matcher: &M,
    rules: &[CssRule],
    config: &SniffConfig,
    mut matched: RuleMap,
) -> Option<RuleMap> {
    for (index, rule) in rules.iter().enumerate() {
        match rule {
            CssRule::Style {
                selector_text,
                declarations,
            } => {
                if !policy::rule_is_allowed(selector_text, config) {
                    continue;
                }
                for selector in split_selectors(selector_text) {
                    match test_selector(matcher, &selector) {
                        MatchOutcome::Matched => {
                            record_selector(&mut matched, index, selector, declarations)
                        }
                        MatchOutcome::NotMatched => {}
                        MatchOutcome::Unsupported(error) => {
                            report_unsupported(selector_text, &error)
                        }
                    }
                }
            }
            CssRule::Grouping {
                kind,
                condition_text,
                rules: nested,
            } => {
                if !policy::media_is_allowed(condition_text, config) {
                    continue;
                }
                let existing = match matched.remove(&index) {
                    Some(RuleMatch::Group(group)) => group.children,
                    _ => RuleMap::new(),
                };
                if let Some(children) = match_rules(matcher, nested, config, existing) {
                    matched.insert(
                        index,
                        RuleMatch::Group(ConditionalGroup::new(*kind, condition_text, children)),
                    );
                }
            }
            CssRule::Other { .. } => {}
        }
    }

    (!matched.is_empty()).then_some(matched)
}

fn record_selector(matched: &mut RuleMap, index: usize, selector: String, declarations: &str) {
    match matched.get_mut(&index) {
        Some(RuleMatch::Simple(simple)) => simple.add_selector(selector),
        _ => {
            matched.insert(
                index,
                RuleMatch::Simple(SimpleMatch::new(selector, declarations)),
            );
        }
    }
}

fn report_unsupported(selector_text: &str, error: &SelectorError) {
    if selector_text.trim() == "@charset" {
        log::error!("Cannot match `{}`: {}", selector_text, error);
    } else {
        log::trace!("Skipping selector in `{}`: {}", selector_text, error);
    }
}
