use crate::sniff::host::{MatchOutcome, SelectorMatcher};

/// Pseudo-classes kept when a selector is normalized. `::` forms are compared as `:`.
pub const STRUCTURAL_PSEUDO_ALLOWLIST: [&str; 5] = [
    ":first-child",
    ":last-child",
    ":first-letter",
    ":first-line",
    ":first",
];

const PRIVATE_USE_START: char = '\u{E000}';
const PRIVATE_USE_END: char = '\u{F8FF}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The selector starts with `:` and counts as matching any element.
    AlwaysMatch,
    /// Test this selector against the element instead.
    Test(String),
}

/// Reduces a selector to the part an element can be tested against.
///
/// Everything from the first pseudo-class colon to the end is dropped (so `a:hover`
/// becomes `a` and `p::after` becomes `p`), unless that remainder is exactly one of
/// [`STRUCTURAL_PSEUDO_ALLOWLIST`]. Escaped colons (`\:`) and colons inside `[...]` or
/// quoted strings are left alone.
pub fn normalize_selector(selector: &str) -> Normalized {
    if selector.starts_with(':') {
        return Normalized::AlwaysMatch;
    }

    let placeholder = placeholder_for(selector);
    let masked = selector.replace("\\:", &placeholder);
    let tested = match pseudo_start(&masked) {
        Some(index) if !is_allowlisted(&masked[index..]) => &masked[..index],
        _ => masked.as_str(),
    };
    Normalized::Test(tested.replace(&placeholder, "\\:"))
}

/// Byte offset of the first `:` outside attribute brackets, quoted strings and escapes.
fn pseudo_start(selector: &str) -> Option<usize> {
    let mut brackets = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = selector.char_indices();
    while let Some((index, c)) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                chars.next();
            }
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => brackets += 1,
            (None, ']') => brackets = brackets.saturating_sub(1),
            (None, ':') if brackets == 0 => return Some(index),
            _ => {}
        }
    }
    None
}

/// A private-use character that does not occur in `selector`.
fn placeholder_for(selector: &str) -> String {
    (PRIVATE_USE_START..=PRIVATE_USE_END)
        .find(|c| !selector.contains(*c))
        .unwrap_or(PRIVATE_USE_START)
        .to_string()
}

fn is_allowlisted(pseudo: &str) -> bool {
    let single = match pseudo.strip_prefix("::") {
        Some(rest) => format!(":{}", rest),
        None => pseudo.to_string(),
    };
    STRUCTURAL_PSEUDO_ALLOWLIST.contains(&single.as_str())
}

/// Tests one selector from a rule against an element, after normalizing it.
pub fn test_selector<M: SelectorMatcher + ?Sized>(matcher: &M, selector: &str) -> MatchOutcome {
    match normalize_selector(selector) {
        Normalized::AlwaysMatch => MatchOutcome::Matched,
        Normalized::Test(normalized) => MatchOutcome::from(matcher.try_match(&normalized)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::css_matcher::SelectorError;

    fn test(s: &str) -> Normalized {
        Normalized::Test(s.to_string())
    }

    #[test]
    fn test_strips_dynamic_pseudos() {
        assert_eq!(normalize_selector("a:hover"), test("a"));
        assert_eq!(normalize_selector("p::after"), test("p"));
        assert_eq!(normalize_selector("ul li:hover > a"), test("ul li"));
        assert_eq!(normalize_selector("p:first-child a"), test("p"));
    }

    #[test]
    fn test_keeps_structural_pseudos() {
        assert_eq!(normalize_selector("li:first-child"), test("li:first-child"));
        assert_eq!(normalize_selector("p::first-line"), test("p::first-line"));
        assert_eq!(normalize_selector("@page:first"), test("@page:first"));
    }

    #[test]
    fn test_escaped_colons_survive() {
        assert_eq!(normalize_selector(".link.\\:focus"), test(".link.\\:focus"));
        assert_eq!(normalize_selector(".md\\:flex:hover"), test(".md\\:flex"));
    }

    #[test]
    fn test_colons_in_attribute_values_survive() {
        assert_eq!(normalize_selector("a[href^=\"http:\"]"), test("a[href^=\"http:\"]"));
        assert_eq!(normalize_selector("[data-t=\"a:b\"]:hover"), test("[data-t=\"a:b\"]"));
        assert_eq!(normalize_selector("[title='x]:y']::before"), test("[title='x]:y']"));
        assert_eq!(normalize_selector("a[data-x=\"a\\\":b\"]:focus"), test("a[data-x=\"a\\\":b\"]"));
    }

    #[test]
    fn test_vendor_prefixed_pseudos() {
        assert_eq!(normalize_selector("input:-webkit-autofill"), test("input"));
        assert_eq!(normalize_selector("input::-moz-placeholder"), test("input"));
        assert_eq!(normalize_selector("a:-ms-input-placeholder"), test("a"));
        assert_eq!(normalize_selector("::-webkit-scrollbar"), Normalized::AlwaysMatch);
        assert_eq!(normalize_selector("p:first"), test("p:first"));
        assert_eq!(normalize_selector("p::first"), test("p::first"));
    }

    #[test]
    fn test_leading_colon_always_matches() {
        assert_eq!(normalize_selector(":root"), Normalized::AlwaysMatch);
        assert_eq!(normalize_selector("::selection"), Normalized::AlwaysMatch);
    }

    #[test]
    fn test_placeholder_avoids_collisions() {
        let selector = format!(".a{}\\:b:hover", PRIVATE_USE_START);
        let expected = format!(".a{}\\:b", PRIVATE_USE_START);
        assert_eq!(normalize_selector(&selector), test(&expected));
    }

    #[test]
    fn test_selector_reports_matcher_errors() {
        let matcher = |s: &str| -> Result<bool, SelectorError> {
            match s {
                "a" => Ok(true),
                "@page:first" => Err(SelectorError::Unsupported {
                    selector: s.into(),
                    reason: "at-rule".into(),
                }),
                _ => Ok(false),
            }
        };
        assert_eq!(test_selector(&matcher, "a:hover"), MatchOutcome::Matched);
        assert_eq!(test_selector(&matcher, "b"), MatchOutcome::NotMatched);
        assert_eq!(test_selector(&matcher, ":root"), MatchOutcome::Matched);
        assert!(!test_selector(&matcher, "@page:first").is_match());
    }
}
