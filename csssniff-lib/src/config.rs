//! Configuration for a sniffing pass: descendant traversal and the whitelist/blacklist
//! policies applied to stylesheets, media conditions and rule selectors.
//!
//! The JSON shape mirrors the options object callers usually hand around:
//!
//! ```json
//! { "ignoreChildren": false, "blacklist": { "media": "print", "rule": [".ad", "#promo"] } }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SniffConfig {
    /// Only match the given elements, not their descendants.
    pub ignore_children: bool,
    pub whitelist: Option<PolicySet>,
    pub blacklist: Option<PolicySet>,
}

/// Substring patterns per policy target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySet {
    pub stylesheet: Option<Patterns>,
    pub media: Option<Patterns>,
    pub rule: Option<Patterns>,
}

/// What a policy pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyTarget {
    /// The owner node's attributes, serialized as JSON.
    StyleSheet,
    /// A grouping rule's condition text, e.g. `print`.
    Media,
    /// A style rule's raw selector text.
    Rule,
}

/// One or more substring patterns. Deserializes from a string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternsRepr", into = "Vec<String>")]
pub struct Patterns(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternsRepr {
    One(String),
    Many(Vec<String>),
}

impl From<PatternsRepr> for Patterns {
    fn from(repr: PatternsRepr) -> Self {
        match repr {
            PatternsRepr::One(pattern) => Patterns(vec![pattern]),
            PatternsRepr::Many(patterns) => Patterns(patterns),
        }
    }
}

impl From<Patterns> for Vec<String> {
    fn from(patterns: Patterns) -> Self {
        patterns.0
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Patterns(vec![pattern.to_string()])
    }
}

impl<S: Into<String>> FromIterator<S> for Patterns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Patterns(iter.into_iter().map(Into::into).collect())
    }
}

impl Patterns {
    /// True if `candidate` contains at least one pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.iter().any(|pattern| candidate.contains(pattern.as_str()))
    }

    pub fn push(&mut self, pattern: impl Into<String>) {
        self.0.push(pattern.into());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl PolicySet {
    pub fn get(&self, target: PolicyTarget) -> Option<&Patterns> {
        match target {
            PolicyTarget::StyleSheet => self.stylesheet.as_ref(),
            PolicyTarget::Media => self.media.as_ref(),
            PolicyTarget::Rule => self.rule.as_ref(),
        }
    }

    fn slot_mut(&mut self, target: PolicyTarget) -> &mut Option<Patterns> {
        match target {
            PolicyTarget::StyleSheet => &mut self.stylesheet,
            PolicyTarget::Media => &mut self.media,
            PolicyTarget::Rule => &mut self.rule,
        }
    }

    /// Adds a pattern for `target`, creating the pattern list if needed.
    pub fn add(&mut self, target: PolicyTarget, pattern: impl Into<String>) {
        self.slot_mut(target)
            .get_or_insert_with(Patterns::default)
            .push(pattern);
    }
}

impl SniffConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn ignore_children(mut self, ignore: bool) -> Self {
        self.ignore_children = ignore;
        self
    }

    pub fn with_whitelist(mut self, target: PolicyTarget, pattern: impl Into<String>) -> Self {
        self.whitelist
            .get_or_insert_with(PolicySet::default)
            .add(target, pattern);
        self
    }

    pub fn with_blacklist(mut self, target: PolicyTarget, pattern: impl Into<String>) -> Self {
        self.blacklist
            .get_or_insert_with(PolicySet::default)
            .add(target, pattern);
        self
    }

    /// The (whitelist, blacklist) patterns configured for `target`.
    pub fn policy(&self, target: PolicyTarget) -> (Option<&Patterns>, Option<&Patterns>) {
        (
            self.whitelist.as_ref().and_then(|set| set.get(target)),
            self.blacklist.as_ref().and_then(|set| set.get(target)),
        )
    }
}
