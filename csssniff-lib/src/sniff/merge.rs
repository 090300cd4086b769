use crate::sniff::matched::{MatchedCss, RuleMap, RuleMatch};

/// Merges several matched structures into one, later structures winning.
///
/// Conditional groups present in both sides are merged recursively. Any other entry,
/// including a simple rule's selector list, is replaced by the later value.
pub fn deep_merge_rules<'a, I>(structures: I) -> MatchedCss
where
    I: IntoIterator<Item = &'a MatchedCss>,
{
    structures
        .into_iter()
        .fold(MatchedCss::new(), |mut merged, source| {
            merged.merge(source);
            merged
        })
}

impl MatchedCss {
    /// Merges `other` into `self`; see [`deep_merge_rules`].
    pub fn merge(&mut self, other: &MatchedCss) {
        for (index, rules) in &other.sheets {
            merge_rule_maps(self.sheets.entry(*index).or_default(), rules);
        }
    }
}

fn merge_rule_maps(target: &mut RuleMap, source: &RuleMap) {
    for (index, rule) in source {
        match (target.get_mut(index), rule) {
            (Some(RuleMatch::Group(existing)), RuleMatch::Group(incoming)) => {
                existing.before.clone_from(&incoming.before);
                existing.after.clone_from(&incoming.after);
                merge_rule_maps(&mut existing.children, &incoming.children);
            }
            _ => {
                target.insert(*index, rule.clone());
            }
        }
    }
}
