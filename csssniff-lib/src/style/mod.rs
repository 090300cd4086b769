pub mod css_matcher;
pub mod cssom;
pub mod stylesheet_parser;
