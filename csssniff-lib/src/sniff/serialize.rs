use crate::sniff::matched::{MatchedCss, RuleMap, RuleMatch};
use std::fmt;

/// Renders matched rules as CSS text, sheets and rules in ascending index order.
///
/// Each simple rule becomes its matched selectors joined by `,` followed by its
/// declaration block; groups wrap their children in `before`/`after`. No whitespace is
/// added. `None` renders as an empty string.
pub fn serialize_css_rules<'a>(matched: impl Into<Option<&'a MatchedCss>>) -> String {
    let mut css = String::new();
    if let Some(matched) = matched.into() {
        for rules in matched.values() {
            write_rule_map(&mut css, rules);
        }
    }
    css
}

fn write_rule_map(css: &mut String, rules: &RuleMap) {
    for rule in rules.values() {
        match rule {
            RuleMatch::Simple(simple) => {
                css.push_str(&simple.selectors.join(","));
                css.push_str(&simple.properties);
            }
            RuleMatch::Group(group) => {
                css.push_str(&group.before);
                write_rule_map(css, &group.children);
                css.push_str(&group.after);
            }
        }
    }
}

impl fmt::Display for MatchedCss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_css_rules(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniff::matched::{ConditionalGroup, SimpleMatch};
    use crate::style::cssom::GroupingKind;

    #[test]
    fn test_nested_output() {
        let nested = RuleMap::from([(
            0,
            RuleMatch::Simple(SimpleMatch::new("p".into(), "{color: purple;}")),
        )]);
        let mut simple = SimpleMatch::new("p".into(), "{background: red;}");
        simple.add_selector("a".into());
        let mut matched = MatchedCss::new();
        matched.insert(
            0,
            RuleMap::from([
                (4, RuleMatch::Group(ConditionalGroup::new(GroupingKind::Media, "print", nested))),
                (1, RuleMatch::Simple(simple)),
            ]),
        );
        assert_eq!(
            serialize_css_rules(&matched),
            "p,a{background: red;}@media print {p{color: purple;}}"
        );
        assert_eq!(matched.to_string(), serialize_css_rules(&matched));
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(serialize_css_rules(&MatchedCss::new()), "");
        assert_eq!(serialize_css_rules(None::<&MatchedCss>), "");
    }
}
