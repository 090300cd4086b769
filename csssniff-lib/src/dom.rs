use html5ever::QualName;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;
    use crate::style::cssom::{OwnerNode, StyleSheet};

    /// Shared handle to a node in the tree.
    pub type Handle = Rc<RefCell<Node>>;
    /// Non-owning back pointer (child -> parent).
    pub type WeakHandle = Weak<RefCell<Node>>;

    #[derive(Debug)]
    pub struct Node {
        pub data: NodeData,
        pub parent: Option<WeakHandle>,
        pub children: Vec<Handle>,
    }

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order.
        pub attributes: Vec<(String, String)>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Handle,
        pub doctype: RefCell<Option<Doctype>>,
        pub style_sheets: Vec<StyleSheet>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl Node {
        pub fn new(data: NodeData) -> Handle {
            Rc::new(RefCell::new(Node {
                data,
                parent: None,
                children: Vec::new(),
            }))
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match &self.data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn is_element(&self) -> bool {
            matches!(self.data, NodeData::Element(_))
        }
    }

    impl ElementNode {
        pub fn new(qual_name: QualName, attributes: Vec<(String, String)>) -> Self {
            ElementNode {
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
            }
        }

        pub fn get_attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn id(&self) -> Option<&str> {
            self.get_attribute("id")
        }

        pub fn classes(&self) -> impl Iterator<Item = &str> {
            self.get_attribute("class")
                .unwrap_or_default()
                .split_ascii_whitespace()
        }

        /// Snapshot of this element as the owner of a stylesheet.
        pub fn to_owner_node(&self) -> OwnerNode {
            OwnerNode {
                tag: self.tag.clone(),
                attributes: self.attributes.clone(),
            }
        }
    }

    impl Document {
        /// The stylesheets of this document, in document order.
        pub fn style_sheets(&self) -> &[StyleSheet] {
            &self.style_sheets
        }

        /// Appends a stylesheet that has no owner node (e.g. one supplied from outside the markup).
        pub fn add_style_sheet(&mut self, sheet: StyleSheet) {
            self.style_sheets.push(sheet);
        }

        /// Fills every `<link rel="stylesheet">` placeholder using `loader`, which maps an
        /// href to CSS text. Sheets the loader cannot provide stay empty.
        pub fn load_linked_style_sheets<F, E>(&mut self, mut loader: F)
        where
            F: FnMut(&str) -> Result<String, E>,
            E: std::fmt::Display,
        {
            for sheet in &mut self.style_sheets {
                let Some(href) = sheet.href.clone() else {
                    continue;
                };
                match loader(&href) {
                    Ok(css) => sheet.rules = StyleSheet::parse(&css, None).rules,
                    Err(e) => log::warn!("Could not load stylesheet {}: {}", href, e),
                }
            }
        }

        /// All elements matching `selector`, in tree order.
        pub fn query_selector_all(
            &self,
            selector: &str,
        ) -> Result<Vec<Handle>, crate::style::css_matcher::SelectorError> {
            let selectors = crate::style::css_matcher::parse_selector_list(selector)?;
            let mut found = Vec::new();
            collect_matching(&self.root, &selectors, &mut found);
            Ok(found)
        }

        pub fn body(&self) -> Option<Handle> {
            find_first(&self.root, &|elem| elem.tag.eq_ignore_ascii_case("body"))
        }
    }

    fn collect_matching(
        node: &Handle,
        selectors: &[crate::style::css_matcher::ComplexSelector],
        found: &mut Vec<Handle>,
    ) {
        if is_element(node)
            && selectors
                .iter()
                .any(|sel| crate::style::css_matcher::matches_complex_selector(node, sel))
        {
            found.push(Rc::clone(node));
        }
        for child in &node.borrow().children {
            collect_matching(child, selectors, found);
        }
    }

    fn find_first(node: &Handle, pred: &dyn Fn(&ElementNode) -> bool) -> Option<Handle> {
        if node.borrow().as_element().is_some_and(pred) {
            return Some(Rc::clone(node));
        }
        node.borrow()
            .children
            .iter()
            .find_map(|child| find_first(child, pred))
    }

    pub fn is_element(node: &Handle) -> bool {
        node.borrow().is_element()
    }

    /// The parent if it is an element (the document root does not count).
    pub fn parent_element(node: &Handle) -> Option<Handle> {
        let parent = node.borrow().parent.as_ref()?.upgrade()?;
        if is_element(&parent) {
            Some(parent)
        } else {
            None
        }
    }

    /// Element siblings of `node` including itself, in order. A parentless node is its own
    /// only sibling.
    pub fn element_siblings(node: &Handle) -> Vec<Handle> {
        match node.borrow().parent.as_ref().and_then(Weak::upgrade) {
            Some(parent) => element_children(&parent),
            None => vec![Rc::clone(node)],
        }
    }

    pub fn element_children(node: &Handle) -> Vec<Handle> {
        node.borrow()
            .children
            .iter()
            .filter(|child| is_element(child))
            .cloned()
            .collect()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(node: &Handle) -> String {
        let mut out = String::new();
        push_text(node, &mut out);
        out
    }

    fn push_text(node: &Handle, out: &mut String) {
        let node = node.borrow();
        if let NodeData::Text(text) = &node.data {
            out.push_str(text);
        }
        for child in &node.children {
            push_text(child, out);
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Node::new(NodeData::DocumentRoot),
            doctype: RefCell::new(None),
            style_sheets: Vec::new(),
        }
    }
}
