use crate::config::SniffConfig;
use crate::dom::dom_tree::Document;
use crate::error::Result;
use crate::parser::html;
use crate::sniff::{get_css_rules, serialize_css_rules, MatchedCss, Options};

pub mod used_css {
    use super::*;

    /// Parses `html_content`, selects the candidate elements with `selector` and returns
    /// the CSS they (and, unless configured otherwise, their descendants) use.
    pub fn extract(html_content: &str, selector: &str, config: &SniffConfig) -> Result<String> {
        let document = html::create_dom_tree(html_content);
        let matched = extract_from_document(&document, selector, config)?;
        Ok(serialize_css_rules(&matched))
    }

    /// Same as [`extract`] for an already parsed document, returning the structured result.
    pub fn extract_from_document(
        document: &Document,
        selector: &str,
        config: &SniffConfig,
    ) -> Result<MatchedCss> {
        let elements = document.query_selector_all(selector)?;
        log::debug!("{} candidate elements for `{}`", elements.len(), selector);
        let options = Options::for_document(document, config);
        Ok(get_css_rules(&elements, &options, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_extract_used_css() {
        let html_str = r#"<!DOCTYPE html>
<html>
<head>
<style>
.red { background: red; }
#blue { color: blue; }
p { color: green; }
.red > #blue { font-size: 20px; }
</style>
</head>
<body>
  <div class="red">Hello Red
    <div id="blue">Hello Blue</div>
  </div>
  <p>Unstyled paragraph</p>
</body>
</html>"#;

        let css = used_css::extract(html_str, ".red", &SniffConfig::default()).unwrap();
        assert_eq!(
            css,
            ".red{background: red;}#blue{color: blue;}.red > #blue{font-size: 20px;}"
        );
    }

    #[test]
    fn test_invalid_query() {
        let result = used_css::extract("<p></p>", "p:hover", &SniffConfig::default());
        assert!(matches!(result, Err(Error::Query(_))));
    }
}
