use crate::dom::dom_tree::{self, Handle, NodeData};
use std::rc::Rc;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Why a selector could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector `{selector}`: {reason}")]
    Unsupported { selector: String, reason: String },
}

/// Supported attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
    pub case_insensitive: bool,
}

/// Pseudo-classes the matcher understands. Everything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    Root,
    /// `:first` (paged media); applies to whatever the rest of the compound matches.
    First,
    /// `:first-letter` / `::first-letter`, matched against the originating element.
    FirstLetter,
    /// `:first-line` / `::first-line`, matched against the originating element.
    FirstLine,
}

/// A compound selector: an optional tag, ids, classes, attributes and pseudo-classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Parse a comma-separated selector list, e.g. `"div.red > p#header, a[href^=http]"`.
pub fn parse_selector_list(selector: &str) -> Result<Vec<ComplexSelector>, SelectorError> {
    if selector.trim().is_empty() {
        return Err(SelectorError::Empty);
    }
    SelectorParser::new(selector).parse_list()
}

struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '_' || c == '\\' || !c.is_ascii()
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str) -> Self {
        SelectorParser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn unsupported(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::Unsupported {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Returns true if any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.unsupported(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.unsupported(format!("expected `{}`", expected))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            list.push(self.parse_complex()?);
            match self.bump() {
                Some(',') => continue,
                None => return Ok(list),
                Some(c) => return Err(self.unsupported(format!("unexpected `{}`", c))),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_whitespace();
        let mut key = self.parse_compound()?;
        let mut ancestors = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::AdjacentSibling,
                Some('~') => Combinator::GeneralSibling,
                Some(',') | None => break,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.unsupported(format!("unexpected `{}`", c))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            ancestors.push((combinator, key));
            key = self.parse_compound()?;
        }

        ancestors.reverse();
        Ok(ComplexSelector { key, ancestors })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::default();
        let start = self.pos;

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    let id = self.parse_ident()?;
                    compound.ids.push(id);
                }
                Some('.') => {
                    self.bump();
                    let class = self.parse_ident()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    let attribute = self.parse_attribute()?;
                    compound.attributes.push(attribute);
                }
                Some(':') => {
                    let pseudo = self.parse_pseudo()?;
                    compound.pseudo_classes.push(pseudo);
                }
                Some('|') => return Err(self.unsupported("namespaces are not supported")),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.unsupported(format!("unexpected `{}`", c)),
                None => self.unsupported("expected a selector"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                ident.push(self.parse_escape()?);
            } else if is_name_char(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            Err(self.unsupported("expected an identifier"))
        } else {
            Ok(ident)
        }
    }

    /// Decodes the escape following a backslash: either a literal character
    /// (`\:` -> `:`) or up to six hex digits and one optional trailing space.
    fn parse_escape(&mut self) -> Result<char, SelectorError> {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.bump();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            return match self.bump() {
                Some(c) => Ok(c),
                None => Err(self.unsupported("dangling escape")),
            };
        }
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}'))
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    if self.peek() == Some('\n') {
                        self.bump();
                    } else {
                        value.push(self.parse_escape()?);
                    }
                }
                Some(c) => value.push(c),
                None => return Err(self.unsupported("unterminated string")),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.bump() {
            Some(']') => {
                return Ok(AttributeSelector {
                    name,
                    operator: None,
                    value: None,
                    case_insensitive: false,
                })
            }
            Some('=') => AttributeOperator::Exact,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                match c {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            _ => return Err(self.unsupported("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.parse_string(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                case_insensitive = true;
                self.skip_whitespace();
            }
            Some('s' | 'S') => {
                self.bump();
                self.skip_whitespace();
            }
            _ => {}
        }
        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            operator: Some(operator),
            value: Some(value),
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass, SelectorError> {
        self.expect(':')?;
        let double_colon = self.peek() == Some(':');
        if double_colon {
            self.bump();
        }
        let name = self.parse_ident()?.to_ascii_lowercase();
        if self.peek() == Some('(') {
            return Err(self.unsupported(format!("functional pseudo-class `{}()`", name)));
        }

        let pseudo = match (double_colon, name.as_str()) {
            (false, "first-child") => PseudoClass::FirstChild,
            (false, "last-child") => PseudoClass::LastChild,
            (false, "only-child") => PseudoClass::OnlyChild,
            (false, "root") => PseudoClass::Root,
            (false, "first") => PseudoClass::First,
            (_, "first-letter") => PseudoClass::FirstLetter,
            (_, "first-line") => PseudoClass::FirstLine,
            _ => {
                let prefix = if double_colon { "::" } else { ":" };
                return Err(self.unsupported(format!("unknown pseudo `{}{}`", prefix, name)));
            }
        };
        Ok(pseudo)
    }
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Parses `selector` and tests it against `node`. Non-element nodes never match.
///
/// This is the host matching primitive: selectors it cannot evaluate are reported
/// as [`SelectorError`] rather than silently treated as non-matching.
pub fn matches_selector(node: &Handle, selector: &str) -> Result<bool, SelectorError> {
    let selectors = parse_selector_list(selector)?;
    Ok(dom_tree::is_element(node)
        && selectors
            .iter()
            .any(|complex| matches_complex_selector(node, complex)))
}

/// Matches a ComplexSelector against a candidate element, right to left, backtracking
/// through ancestors and siblings as needed.
pub fn matches_complex_selector(candidate: &Handle, complex: &ComplexSelector) -> bool {
    matches_compound(candidate, &complex.key) && matches_ancestors(candidate, &complex.ancestors)
}

fn matches_ancestors(node: &Handle, rest: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = rest.split_first() else {
        return true;
    };
    let candidate_matches =
        |other: &Handle| matches_compound(other, compound) && matches_ancestors(other, rest);

    match combinator {
        Combinator::Child => dom_tree::parent_element(node).is_some_and(|p| candidate_matches(&p)),
        Combinator::Descendant => {
            let mut ancestor = dom_tree::parent_element(node);
            while let Some(current) = ancestor {
                if candidate_matches(&current) {
                    return true;
                }
                ancestor = dom_tree::parent_element(&current);
            }
            false
        }
        Combinator::AdjacentSibling => preceding_siblings(node)
            .last()
            .is_some_and(|s| candidate_matches(s)),
        Combinator::GeneralSibling => preceding_siblings(node).iter().any(candidate_matches),
    }
}

/// Element siblings before `node`, in document order.
fn preceding_siblings(node: &Handle) -> Vec<Handle> {
    let mut siblings = dom_tree::element_siblings(node);
    let index = siblings
        .iter()
        .position(|s| Rc::ptr_eq(s, node))
        .unwrap_or(0);
    siblings.truncate(index);
    siblings
}

/// Returns true if the given node is an element matching the CompoundSelector.
pub fn matches_compound(node: &Handle, compound: &CompoundSelector) -> bool {
    let node_ref = node.borrow();
    let Some(elem) = node_ref.as_element() else {
        return false;
    };

    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound.ids.iter().all(|id| elem.id() == Some(id.as_str())) {
        return false;
    }
    if !compound
        .classes
        .iter()
        .all(|class| elem.classes().any(|c| c == class))
    {
        return false;
    }
    if !compound
        .attributes
        .iter()
        .all(|attr| matches_attribute(elem.get_attribute(&attr.name), attr))
    {
        return false;
    }
    drop(node_ref);

    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| matches_pseudo(node, *pseudo))
}

fn matches_attribute(actual: Option<&str>, selector: &AttributeSelector) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let (Some(operator), Some(expected)) = (selector.operator, selector.value.as_deref()) else {
        // No operator means existence is enough.
        return true;
    };
    let (actual, expected) = if selector.case_insensitive {
        (actual.to_lowercase(), expected.to_lowercase())
    } else {
        (actual.to_string(), expected.to_string())
    };

    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{}-", expected))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

fn matches_pseudo(node: &Handle, pseudo: PseudoClass) -> bool {
    match pseudo {
        PseudoClass::FirstChild => dom_tree::element_siblings(node)
            .first()
            .is_some_and(|first| Rc::ptr_eq(first, node)),
        PseudoClass::LastChild => dom_tree::element_siblings(node)
            .last()
            .is_some_and(|last| Rc::ptr_eq(last, node)),
        PseudoClass::OnlyChild => dom_tree::element_siblings(node).len() == 1,
        PseudoClass::Root => node
            .borrow()
            .parent
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .is_some_and(|parent| matches!(parent.borrow().data, NodeData::DocumentRoot)),
        PseudoClass::First | PseudoClass::FirstLetter | PseudoClass::FirstLine => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::Document;
    use crate::parser::html::create_dom_tree;

    fn first(document: &Document, query: &str) -> Handle {
        document.query_selector_all(query).unwrap().remove(0)
    }

    #[test]
    fn test_parse_complex_selector_order() {
        let list = parse_selector_list("div.red > p#header + span.foo").unwrap();
        assert_eq!(list.len(), 1);
        let complex = &list[0];
        assert_eq!(complex.key.tag.as_deref(), Some("span"));
        assert_eq!(complex.key.classes, vec!["foo".to_string()]);
        assert_eq!(complex.ancestors[0].0, Combinator::AdjacentSibling);
        assert_eq!(complex.ancestors[0].1.ids, vec!["header".to_string()]);
        assert_eq!(complex.ancestors[1].0, Combinator::Child);
        assert_eq!(complex.ancestors[1].1.tag.as_deref(), Some("div"));
    }

    #[test]
    fn test_escaped_colon_in_class() {
        let list = parse_selector_list(".link.\\:focus").unwrap();
        assert_eq!(
            list[0].key.classes,
            vec!["link".to_string(), ":focus".to_string()]
        );
        let doc = create_dom_tree(r#"<p class="link :focus">x</p>"#);
        let p = first(&doc, "p");
        assert_eq!(matches_selector(&p, ".link.\\:focus"), Ok(true));
        assert_eq!(matches_selector(&p, ".link.\\3A focus"), Ok(true));
    }

    #[test]
    fn test_combinators_backtrack() {
        let doc =
            create_dom_tree(r#"<div class="a"><div class="b"><section><p>x</p></section></div></div>"#);
        let p = first(&doc, "p");
        assert_eq!(matches_selector(&p, ".a > .b p"), Ok(true));
        assert_eq!(matches_selector(&p, ".b > p"), Ok(false));
        assert_eq!(matches_selector(&p, "div section > p"), Ok(true));
    }

    #[test]
    fn test_sibling_combinators() {
        let doc = create_dom_tree("<ul><li id=a>1</li><li id=b>2</li><li id=c>3</li></ul>");
        let c = first(&doc, "#c");
        assert_eq!(matches_selector(&c, "#b + #c"), Ok(true));
        assert_eq!(matches_selector(&c, "#a + #c"), Ok(false));
        assert_eq!(matches_selector(&c, "#a ~ li"), Ok(true));
    }

    #[test]
    fn test_attribute_operators() {
        let doc = create_dom_tree(
            r#"<a href="https://example.com/x.PDF" lang="en-US" rel="nofollow noopener">x</a>"#,
        );
        let a = first(&doc, "a");
        assert_eq!(matches_selector(&a, "[href]"), Ok(true));
        assert_eq!(matches_selector(&a, r#"a[href^="https"]"#), Ok(true));
        assert_eq!(matches_selector(&a, "a[href$='.pdf']"), Ok(false));
        assert_eq!(matches_selector(&a, "a[href$='.pdf' i]"), Ok(true));
        assert_eq!(matches_selector(&a, "[lang|=en]"), Ok(true));
        assert_eq!(matches_selector(&a, "[rel~=noopener]"), Ok(true));
        assert_eq!(matches_selector(&a, "[href*=example]"), Ok(true));
        assert_eq!(matches_selector(&a, r#"[data-x="a,b"]"#), Ok(false));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let doc = create_dom_tree("<div><p id=a>1</p><p id=b>2</p></div>");
        let a = first(&doc, "#a");
        let b = first(&doc, "#b");
        assert_eq!(matches_selector(&a, "p:first-child"), Ok(true));
        assert_eq!(matches_selector(&b, "p:first-child"), Ok(false));
        assert_eq!(matches_selector(&b, "div > :last-child"), Ok(true));
        assert_eq!(matches_selector(&a, "p::first-line"), Ok(true));
        assert_eq!(matches_selector(&a, "p:only-child"), Ok(false));
        let html_elem = first(&doc, "html");
        assert_eq!(matches_selector(&html_elem, ":root"), Ok(true));
    }

    #[test]
    fn test_unsupported_selectors_are_errors() {
        let doc = create_dom_tree("<p>x</p>");
        let p = first(&doc, "p");
        assert!(matches!(
            matches_selector(&p, "p:hover"),
            Err(SelectorError::Unsupported { .. })
        ));
        assert!(matches_selector(&p, "p::-moz-selection").is_err());
        assert!(matches_selector(&p, ":not(a)").is_err());
        assert!(matches_selector(&p, "@charset").is_err());
        assert!(matches_selector(&p, "svg|rect").is_err());
        assert_eq!(matches_selector(&p, "  "), Err(SelectorError::Empty));
    }

    #[test]
    fn test_text_nodes_never_match() {
        let doc = create_dom_tree("<p>text</p>");
        let p = first(&doc, "p");
        let text = p.borrow().children[0].clone();
        assert_eq!(matches_selector(&text, "*"), Ok(false));
    }
}
