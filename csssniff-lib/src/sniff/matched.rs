use crate::style::cssom::GroupingKind;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Matched rules of one rule list, keyed by the rule's index in that list.
pub type RuleMap = BTreeMap<usize, RuleMatch>;

/// Matched rules of every stylesheet, keyed by the sheet's index in the document.
///
/// Serializes as a plain JSON object, e.g.
/// `{"0":{"0":{"selectors":["p"],"properties":"{color: red;}"}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchedCss {
    pub sheets: BTreeMap<usize, RuleMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleMatch {
    Simple(SimpleMatch),
    Group(ConditionalGroup),
}

/// A style rule and the selectors from its list that matched, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleMatch {
    pub selectors: Vec<String>,
    /// The declaration block, braces included.
    pub properties: String,
}

/// A conditional group (`@media`, `@supports`) with at least one matched rule inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalGroup {
    /// Opening text, e.g. `@media print {`.
    pub before: String,
    #[serde(deserialize_with = "deserialize_rule_map")]
    pub children: RuleMap,
    pub after: String,
}

/// Reads a `RuleMap` whose index keys arrive as strings. `RuleMatch` is untagged, so
/// nested maps reach this point as buffered content rather than JSON.
fn deserialize_rule_map<'de, D>(deserializer: D) -> Result<RuleMap, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, RuleMatch>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, rule)| {
            key.parse::<usize>()
                .map(|index| (index, rule))
                .map_err(|e| de::Error::custom(format!("invalid rule index `{}`: {}", key, e)))
        })
        .collect()
}

impl MatchedCss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn get(&self, sheet_index: usize) -> Option<&RuleMap> {
        self.sheets.get(&sheet_index)
    }

    pub fn insert(&mut self, sheet_index: usize, rules: RuleMap) -> Option<RuleMap> {
        self.sheets.insert(sheet_index, rules)
    }

    pub fn remove(&mut self, sheet_index: usize) -> Option<RuleMap> {
        self.sheets.remove(&sheet_index)
    }

    pub fn values(&self) -> impl Iterator<Item = &RuleMap> {
        self.sheets.values()
    }

    /// Total number of matched selectors, nested groups included.
    pub fn selector_count(&self) -> usize {
        self.values().map(count_selectors).sum()
    }
}

fn count_selectors(rules: &RuleMap) -> usize {
    rules
        .values()
        .map(|rule| match rule {
            RuleMatch::Simple(simple) => simple.selectors.len(),
            RuleMatch::Group(group) => count_selectors(&group.children),
        })
        .sum()
}

impl SimpleMatch {
    pub fn new(selector: String, properties: &str) -> Self {
        SimpleMatch {
            selectors: vec![selector],
            properties: properties.to_string(),
        }
    }

    /// Records `selector` unless it is already present.
    pub fn add_selector(&mut self, selector: String) {
        if !self.selectors.contains(&selector) {
            self.selectors.push(selector);
        }
    }
}

impl ConditionalGroup {
    pub fn new(kind: GroupingKind, condition_text: &str, children: RuleMap) -> Self {
        ConditionalGroup {
            before: format!("{} {} {{", kind.at_keyword(), condition_text),
            children,
            after: "}".to_string(),
        }
    }
}
