//! The sniffing core: walk candidate elements, test each stylesheet rule against them and
//! collect the matching selectors into an index-keyed [`MatchedCss`] that serializes back
//! to CSS in source order.

pub mod host;
pub mod matched;
pub mod merge;
pub mod normalize;
pub mod policy;
pub mod rule_matcher;
pub mod serialize;
pub mod split;
pub mod traverse;

pub use host::{MatchOutcome, MatchTarget, SelectorMatcher};
pub use matched::{ConditionalGroup, MatchedCss, RuleMap, RuleMatch, SimpleMatch};
pub use merge::deep_merge_rules;
pub use serialize::serialize_css_rules;
pub use traverse::{get_css_rules, Options};
