// src/style/cssom.rs: a fully-owned CSS object model, the shape the sniffer walks.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed stylesheet together with the node that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// The `<style>` or `<link>` element this sheet came from. `None` for sheets added
    /// programmatically.
    pub owner: Option<OwnerNode>,
    /// Set for `<link rel="stylesheet">` sheets.
    pub href: Option<String>,
    pub rules: Vec<CssRule>,
}

/// Tag name and attributes of a stylesheet's owner element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupingKind {
    Media,
    Supports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CssRule {
    /// e.g. `p, a { color: red }`
    Style {
        /// The raw selector list, e.g. "p, a".
        selector_text: String,
        /// The declaration block including braces, e.g. "{color: red;}".
        declarations: String,
    },
    /// A conditional group such as `@media print { ... }`.
    Grouping {
        kind: GroupingKind,
        condition_text: String,
        rules: Vec<CssRule>,
    },
    /// Any other at-rule (`@charset`, `@font-face`, `@keyframes`, ...).
    Other { name: String },
}

impl StyleSheet {
    /// An unloaded `<link>` sheet; rules are filled in later by
    /// [`Document::load_linked_style_sheets`](crate::dom::dom_tree::Document::load_linked_style_sheets).
    pub fn linked(href: &str, owner: OwnerNode) -> Self {
        StyleSheet {
            owner: Some(owner),
            href: Some(href.to_string()),
            rules: Vec::new(),
        }
    }
}

impl OwnerNode {
    /// The attribute set serialized as a JSON object, in source order, e.g.
    /// `{"id":"main","media":"print"}`. Stylesheet policies match against this text.
    pub fn attributes_json(&self) -> String {
        let attrs = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(attrs).to_string()
    }
}

impl GroupingKind {
    pub fn at_keyword(self) -> &'static str {
        match self {
            GroupingKind::Media => "@media",
            GroupingKind::Supports => "@supports",
        }
    }
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssRule::Style {
                selector_text,
                declarations,
            } => write!(f, "{} {}", selector_text, declarations),
            CssRule::Grouping {
                kind,
                condition_text,
                rules,
            } => {
                write!(f, "{} {} {{", kind.at_keyword(), condition_text)?;
                for rule in rules {
                    write!(f, " {}", rule)?;
                }
                write!(f, " }}")
            }
            CssRule::Other { name } => write!(f, "@{}", name),
        }
    }
}
