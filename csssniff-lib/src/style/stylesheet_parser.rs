use crate::style::cssom::{CssRule, GroupingKind, OwnerNode, StyleSheet};
use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, SourcePosition, StyleSheetParser,
    Token,
};
use std::fmt;

impl StyleSheet {
    /// Parse a raw CSS string into an owned stylesheet.
    ///
    /// Parsing is lenient: invalid rules and declarations are logged and skipped.
    /// Selector text is kept exactly as written (trimmed); declaration blocks are
    /// re-rendered the way a CSSOM reports them, e.g. `{background: red;}`.
    pub fn parse(css_text: &str, owner: Option<OwnerNode>) -> Self {
        let mut input = ParserInput::new(css_text);
        let mut parser = Parser::new(&mut input);
        StyleSheet {
            owner,
            href: None,
            rules: parse_rule_list(&mut parser),
        }
    }
}

fn parse_rule_list(input: &mut Parser<'_, '_>) -> Vec<CssRule> {
    let mut rule_parser = RuleListParser;
    let mut rules = Vec::new();
    for result in StyleSheetParser::new(input, &mut rule_parser) {
        match result {
            Ok(rule) => rules.push(rule),
            Err((error, slice)) => {
                log::warn!("Skipping invalid CSS rule {:?}: {:?}", slice.trim(), error.kind)
            }
        }
    }
    rules
}

/// Consumes the rest of `input` and returns the source text it covered.
fn consume_raw<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next().is_ok() {}
    input.slice_from(start)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parser for a list of rules, at the top level or inside a grouping rule.
struct RuleListParser;

enum AtRulePrelude {
    Grouping(GroupingKind, String),
    Other(String),
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = AtRulePrelude;
    type AtRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let condition = collapse_whitespace(consume_raw(input));
        let prelude = if name.eq_ignore_ascii_case("media") {
            AtRulePrelude::Grouping(GroupingKind::Media, condition)
        } else if name.eq_ignore_ascii_case("supports") {
            AtRulePrelude::Grouping(GroupingKind::Supports, condition)
        } else {
            AtRulePrelude::Other(name.to_ascii_lowercase())
        };
        Ok(prelude)
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        match prelude {
            AtRulePrelude::Other(name) => Ok(CssRule::Other { name }),
            AtRulePrelude::Grouping(..) => Err(()),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let rule = match prelude {
            AtRulePrelude::Grouping(kind, condition_text) => CssRule::Grouping {
                kind,
                condition_text,
                rules: parse_rule_list(input),
            },
            AtRulePrelude::Other(name) => {
                consume_raw(input);
                CssRule::Other { name }
            }
        };
        Ok(rule)
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = String;
    type QualifiedRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selector_text = consume_raw(input).trim();
        if selector_text.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selector_text.to_string())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut body_parser = DeclarationListParser;
        let mut declarations = Vec::new();
        for result in RuleBodyParser::new(input, &mut body_parser) {
            match result {
                Ok(declaration) => declarations.push(declaration),
                Err((_, slice)) => log::warn!(
                    "Skipping invalid declaration {:?} in `{}`",
                    slice.trim(),
                    prelude
                ),
            }
        }
        Ok(CssRule::Style {
            selector_text: prelude,
            declarations: render_block(&declarations),
        })
    }
}

/// One `name: value` pair, value kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    name: String,
    value: String,
    important: bool,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        f.write_str(";")
    }
}

fn render_block(declarations: &[Declaration]) -> String {
    let body = declarations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{{}}}", body)
}

struct DeclarationListParser;

/// Appends `token` as written, dropping comments and collapsing whitespace runs to one
/// space. Blocks and functions are rendered recursively.
fn push_token<'i>(
    input: &mut Parser<'i, '_>,
    start: SourcePosition,
    token: &Token<'i>,
    out: &mut String,
) {
    match token {
        Token::Comment(_) => {}
        Token::WhiteSpace(_) => {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        Token::Function(_)
        | Token::ParenthesisBlock
        | Token::SquareBracketBlock
        | Token::CurlyBracketBlock => {
            out.push_str(input.slice_from(start));
            let _ = input.parse_nested_block(|nested| {
                render_tokens(nested, out);
                Ok::<(), ParseError<'i, ()>>(())
            });
            out.push(match token {
                Token::SquareBracketBlock => ']',
                Token::CurlyBracketBlock => '}',
                _ => ')',
            });
        }
        _ => out.push_str(input.slice_from(start)),
    }
}

fn render_tokens<'i>(input: &mut Parser<'i, '_>, out: &mut String) {
    loop {
        let start = input.position();
        let Ok(token) = input.next_including_whitespace_and_comments().cloned() else {
            break;
        };
        push_token(input, start, &token, out);
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let mut value = String::new();
        let mut important = false;
        loop {
            let start = input.position();
            let Ok(token) = input.next_including_whitespace_and_comments().cloned() else {
                break;
            };
            if matches!(token, Token::Delim('!'))
                && input
                    .try_parse(|i| i.expect_ident_matching("important"))
                    .is_ok()
            {
                important = true;
                continue;
            }
            push_token(input, start, &token, &mut value);
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        // Custom properties are case-sensitive.
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Ok(Declaration {
            name,
            value: value.to_string(),
            important,
        })
    }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(selector_text: &str, declarations: &str) -> CssRule {
        CssRule::Style {
            selector_text: selector_text.into(),
            declarations: declarations.into(),
        }
    }

    #[test]
    fn test_simple_rule() {
        let sheet = StyleSheet::parse("p { background: red;}", None);
        assert_eq!(sheet.rules, vec![style("p", "{background: red;}")]);
    }

    #[test]
    fn test_selector_text_is_kept_verbatim() {
        let sheet = StyleSheet::parse(
            ".link { background: blue;} .link.\\:focus { background: red;} p::after{content:\"x\"}",
            None,
        );
        assert_eq!(
            sheet.rules,
            vec![
                style(".link", "{background: blue;}"),
                style(".link.\\:focus", "{background: red;}"),
                style("p::after", "{content: \"x\";}"),
            ]
        );
    }

    #[test]
    fn test_important_and_case() {
        let sheet = StyleSheet::parse("a { COLOR: Red!important; --Main: 1px }", None);
        assert_eq!(
            sheet.rules,
            vec![style("a", "{color: Red !important; --Main: 1px;}")]
        );
    }

    #[test]
    fn test_values_drop_comments_and_extra_whitespace() {
        let sheet = StyleSheet::parse(
            "a { color: red /* brand */ ; margin:  0\n   auto; background: rgba(0,  0, /* x */ 0,.5) ! important; content: \"a  /* b */\" }",
            None,
        );
        assert_eq!(
            sheet.rules,
            vec![style(
                "a",
                "{color: red; margin: 0 auto; background: rgba(0, 0, 0,.5) !important; content: \"a  /* b */\";}"
            )]
        );
    }

    #[test]
    fn test_invalid_declarations_are_skipped() {
        let sheet = StyleSheet::parse("p { color: ; margin: 0 auto; 12px }", None);
        assert_eq!(sheet.rules, vec![style("p", "{margin: 0 auto;}")]);
    }

    // A leading `@charset` is consumed by the tokenizer and never becomes a rule.
    #[test]
    fn test_grouping_and_other_at_rules() {
        let css = r#"@charset "utf-8";
            @font-face { font-family: X; src: url(x.woff) }
            @media  screen and (min-width: 600px) { p, a { color: purple } }
            @supports (display: grid) { div { display: grid } }
            @keyframes spin { from { opacity: 0 } to { opacity: 1 } }"#;
        let sheet = StyleSheet::parse(css, None);
        assert_eq!(
            sheet.rules,
            vec![
                CssRule::Other {
                    name: "font-face".into()
                },
                CssRule::Grouping {
                    kind: GroupingKind::Media,
                    condition_text: "screen and (min-width: 600px)".into(),
                    rules: vec![style("p, a", "{color: purple;}")],
                },
                CssRule::Grouping {
                    kind: GroupingKind::Supports,
                    condition_text: "(display: grid)".into(),
                    rules: vec![style("div", "{display: grid;}")],
                },
                CssRule::Other {
                    name: "keyframes".into()
                },
            ]
        );
    }

    #[test]
    fn test_nested_media() {
        let sheet = StyleSheet::parse("@media print { @media (color) { p { x: y } } }", None);
        let CssRule::Grouping { rules, .. } = &sheet.rules[0] else {
            panic!("expected grouping rule");
        };
        assert!(matches!(&rules[0], CssRule::Grouping { condition_text, .. } if condition_text == "(color)"));
    }
}
