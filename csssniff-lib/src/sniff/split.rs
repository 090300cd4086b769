/// Splits a selector list on top-level commas.
///
/// Commas inside `(...)` or `[...]` do not split. Each part is trimmed. Text starting
/// with `@` is not a selector list and is returned unchanged as the only entry.
pub fn split_selectors(selector_text: &str) -> Vec<String> {
    if selector_text.starts_with('@') {
        return vec![selector_text.to_string()];
    }

    let mut selectors = Vec::new();
    let mut current = String::new();
    let (mut parens, mut brackets) = (0usize, 0usize);
    for c in selector_text.chars() {
        match c {
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            ',' if parens == 0 && brackets == 0 => {
                selectors.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    selectors.push(current.trim().to_string());
    selectors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_commas() {
        assert_eq!(split_selectors("p, a ,div > span"), vec!["p", "a", "div > span"]);
    }

    #[test]
    fn test_nested_commas_do_not_split() {
        assert_eq!(
            split_selectors(":is(a, b) c, [title=\"x,y\"]"),
            vec![":is(a, b) c", "[title=\"x,y\"]"]
        );
    }

    #[test]
    fn test_at_rule_passthrough() {
        assert_eq!(split_selectors("@charset"), vec!["@charset"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split_selectors(""), vec![""]);
    }
}
