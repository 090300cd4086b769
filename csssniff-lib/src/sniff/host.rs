use crate::dom::dom_tree::{is_element, Handle};
use crate::style::css_matcher::{self, SelectorError};
use std::rc::Rc;

/// Result of testing one selector against one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NotMatched,
    /// The matcher could not evaluate the selector. Treated as a non-match.
    Unsupported(SelectorError),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched)
    }
}

impl From<Result<bool, SelectorError>> for MatchOutcome {
    fn from(result: Result<bool, SelectorError>) -> Self {
        match result {
            Ok(true) => MatchOutcome::Matched,
            Ok(false) => MatchOutcome::NotMatched,
            Err(e) => MatchOutcome::Unsupported(e),
        }
    }
}

/// Tests a selector against one fixed element.
pub trait SelectorMatcher {
    fn try_match(&self, selector: &str) -> Result<bool, SelectorError>;
}

impl<F> SelectorMatcher for F
where
    F: Fn(&str) -> Result<bool, SelectorError>,
{
    fn try_match(&self, selector: &str) -> Result<bool, SelectorError> {
        self(selector)
    }
}

/// A node the sniffer can visit.
pub trait MatchTarget: Sized {
    type Matcher: SelectorMatcher;

    /// The matcher for this node, or `None` when the node cannot be matched (text,
    /// comments). Resolved once per node.
    fn resolve_matcher(&self) -> Option<Self::Matcher>;

    /// Child nodes in order, elements and non-elements alike.
    fn child_nodes(&self) -> Vec<Self>;
}

/// Matches selectors against an element of the DOM tree.
pub struct ElementMatcher {
    element: Handle,
}

impl SelectorMatcher for ElementMatcher {
    fn try_match(&self, selector: &str) -> Result<bool, SelectorError> {
        css_matcher::matches_selector(&self.element, selector)
    }
}

impl MatchTarget for Handle {
    type Matcher = ElementMatcher;

    fn resolve_matcher(&self) -> Option<ElementMatcher> {
        is_element(self).then(|| ElementMatcher {
            element: Rc::clone(self),
        })
    }

    fn child_nodes(&self) -> Vec<Handle> {
        self.borrow().children.clone()
    }
}
