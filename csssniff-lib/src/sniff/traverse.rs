use crate::config::SniffConfig;
use crate::dom::dom_tree::Document;
use crate::sniff::host::{MatchTarget, SelectorMatcher};
use crate::sniff::matched::MatchedCss;
use crate::sniff::policy;
use crate::sniff::rule_matcher::match_rules;
use crate::style::cssom::StyleSheet;

/// Stylesheets to match against and the policy to apply.
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    pub style_sheets: &'a [StyleSheet],
    pub config: &'a SniffConfig,
}

impl<'a> Options<'a> {
    pub fn new(style_sheets: &'a [StyleSheet], config: &'a SniffConfig) -> Self {
        Options {
            style_sheets,
            config,
        }
    }

    /// Uses every stylesheet of `document`.
    pub fn for_document(document: &'a Document, config: &'a SniffConfig) -> Self {
        Self::new(document.style_sheets(), config)
    }
}

/// Collects the rules used by `elements` and, unless `ignore_children` is set, by all
/// of their descendants.
///
/// Elements are visited in order, depth first. Pass the result of an earlier call as
/// `seed` to keep accumulating into it.
pub fn get_css_rules<N: MatchTarget>(
    elements: &[N],
    options: &Options<'_>,
    seed: Option<MatchedCss>,
) -> MatchedCss {
    let matched = elements
        .iter()
        .fold(seed.unwrap_or_default(), |matched, element| {
            visit(element, options, matched)
        });
    log::debug!(
        "Matched {} selectors across {} stylesheets",
        matched.selector_count(),
        matched.sheets.len()
    );
    matched
}

fn visit<N: MatchTarget>(node: &N, options: &Options<'_>, mut matched: MatchedCss) -> MatchedCss {
    if let Some(matcher) = node.resolve_matcher() {
        matched = match_element(&matcher, options, matched);
    }
    if !options.config.ignore_children {
        for child in node.child_nodes() {
            matched = visit(&child, options, matched);
        }
    }
    matched
}

fn match_element<M: SelectorMatcher>(
    matcher: &M,
    options: &Options<'_>,
    mut matched: MatchedCss,
) -> MatchedCss {
    for (index, sheet) in options.style_sheets.iter().enumerate() {
        if !policy::sheet_is_allowed(sheet, options.config) {
            continue;
        }
        let existing = matched.remove(index).unwrap_or_default();
        if let Some(rules) = match_rules(matcher, &sheet.rules, options.config, existing) {
            matched.insert(index, rules);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyTarget;
    use crate::parser::html::create_dom_tree;
    use crate::sniff::serialize::serialize_css_rules;

    fn sniff(html: &str, query: &str, config: &SniffConfig) -> String {
        let doc = create_dom_tree(html);
        let elements = doc.query_selector_all(query).unwrap();
        let matched = get_css_rules(&elements, &Options::for_document(&doc, config), None);
        serialize_css_rules(&matched)
    }

    #[test]
    fn test_descendants_are_visited() {
        let html = "<style>div { a: b } span { c: d } em { e: f }</style>\
                    <div><span>x</span></div><em>y</em>";
        assert_eq!(
            sniff(html, "div", &SniffConfig::default()),
            "div{a: b;}span{c: d;}"
        );
    }

    #[test]
    fn test_ignore_children() {
        let html = "<style>div { a: b } span { c: d }</style><div><span>x</span></div>";
        let config = SniffConfig::default().ignore_children(true);
        assert_eq!(sniff(html, "div", &config), "div{a: b;}");
    }

    #[test]
    fn test_seed_is_extended() {
        let doc = create_dom_tree("<style>p { a: b } em { c: d }</style><p></p><em></em>");
        let config = SniffConfig::default();
        let options = Options::for_document(&doc, &config);
        let first = get_css_rules(&doc.query_selector_all("p").unwrap(), &options, None);
        let both = get_css_rules(&doc.query_selector_all("em").unwrap(), &options, Some(first));
        assert_eq!(serialize_css_rules(&both), "p{a: b;}em{c: d;}");
    }

    #[test]
    fn test_sheet_indices_and_policy() {
        let html = r#"<style id="base">p { a: b }</style>
            <style media="print">p { c: d }</style>
            <p>x</p>"#;
        let doc = create_dom_tree(html);
        let config = SniffConfig::default().with_blacklist(PolicyTarget::StyleSheet, "print");
        let elements = doc.query_selector_all("p").unwrap();
        let matched = get_css_rules(&elements, &Options::for_document(&doc, &config), None);
        assert_eq!(matched.sheets.keys().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_no_elements() {
        let doc = create_dom_tree("<style>p { a: b }</style>");
        let config = SniffConfig::default();
        let matched = get_css_rules::<crate::dom::dom_tree::Handle>(
            &[],
            &Options::for_document(&doc, &config),
            None,
        );
        assert!(matched.is_empty());
    }
}
