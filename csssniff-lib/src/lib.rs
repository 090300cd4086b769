//! Find the CSS rules a set of HTML elements actually use.
//!
//! ```
//! use csssniff_lib::{extract::used_css, SniffConfig};
//!
//! let html = "<style>p { background: red } a { color: blue }</style><p>hi</p>";
//! let css = used_css::extract(html, "p", &SniffConfig::default()).unwrap();
//! assert_eq!(css, "p{background: red;}");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod parser;
pub mod sniff;
pub mod style;

pub use config::{Patterns, PolicySet, PolicyTarget, SniffConfig};
pub use error::{Error, Result};
pub use sniff::{
    deep_merge_rules, get_css_rules, serialize_css_rules, ConditionalGroup, MatchedCss, Options,
    RuleMap, RuleMatch, SimpleMatch,
};
