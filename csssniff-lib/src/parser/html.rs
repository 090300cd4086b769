//! This module contains functions and types for parsing HTML into a custom DOM tree.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module. Once the tree is complete, the document's
//! stylesheets are collected from `<style>` and `<link rel="stylesheet">` elements.

use crate::dom::dom_tree::{self, Handle, Node, NodeData};
use crate::style::cssom::StyleSheet;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML, with its stylesheets loaded.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = CssSniffTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A custom TreeSink for building the DOM tree used by the parser.
///
/// It holds the Document being built and the current quirks mode.
pub struct CssSniffTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl CssSniffTreeSink {
    /// Creates a new `CssSniffTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        *self.quirks_mode.borrow()
    }
}

impl Default for CssSniffTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple implementation of the `ElemName` trait for our elements.
#[derive(Debug)]
pub struct SniffElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for SniffElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn into_node(child: NodeOrText<Handle>) -> Handle {
    match child {
        NodeOrText::AppendNode(node) => node,
        NodeOrText::AppendText(text) => Node::new(NodeData::Text(text.to_string())),
    }
}

/// Appends `text` to `node` if it is a text node. Returns whether it did.
fn merge_text(node: Option<&Handle>, text: &str) -> bool {
    if let Some(node) = node {
        if let NodeData::Text(existing) = &mut node.borrow_mut().data {
            existing.push_str(text);
            return true;
        }
    }
    false
}

fn detach(target: &Handle) {
    let parent = target.borrow_mut().parent.take();
    if let Some(parent) = parent.and_then(|weak| weak.upgrade()) {
        parent
            .borrow_mut()
            .children
            .retain(|child| !Rc::ptr_eq(child, target));
    }
}

impl TreeSink for CssSniffTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = SniffElemName
    where
        Self: 'a;

    /// Finalizes the Document and builds its stylesheet list.
    fn finish(self) -> Self::Output {
        let mut document = self.document;
        let mut sheets = Vec::new();
        collect_style_sheets(&document.root, &mut sheets);
        log::debug!("Collected {} stylesheet(s) from the document", sheets.len());
        document.style_sheets = sheets;
        document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        log::debug!("HTML parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &target.borrow().data {
            NodeData::Element(elem) => SniffElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => SniffElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect::<Vec<_>>();
        Node::new(NodeData::Element(dom_tree::ElementNode::new(
            name, attributes,
        )))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(format!("{} {}", target, data)))
    }

    /// Appends a child node or text to the given parent node, merging adjacent text.
    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        if let NodeOrText::AppendText(text) = &child {
            if merge_text(parent.borrow().children.last(), text) {
                return;
            }
        }
        let child = into_node(child);
        detach(&child);
        child.borrow_mut().parent = Some(Rc::downgrade(parent));
        parent.borrow_mut().children.push(child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = element
            .borrow()
            .parent
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    /// Inserts a node (or text) immediately before `sibling` in its parent.
    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = sibling.borrow().parent.as_ref().and_then(|w| w.upgrade()) else {
            return;
        };
        let Some(index) = parent
            .borrow()
            .children
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
        else {
            return;
        };

        if let NodeOrText::AppendText(text) = &child {
            let previous = index
                .checked_sub(1)
                .and_then(|i| parent.borrow().children.get(i).cloned());
            if merge_text(previous.as_ref(), text) {
                return;
            }
        }

        let child = into_node(child);
        detach(&child);
        // Detaching may have shifted the sibling if the child came from the same parent.
        let index = parent
            .borrow()
            .children
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(index);
        child.borrow_mut().parent = Some(Rc::downgrade(&parent));
        parent.borrow_mut().children.insert(index, child);
    }

    /// Adds attributes to the target node if they are missing.
    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let NodeData::Element(elem_node) = &mut target.borrow_mut().data {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem_node.attributes.iter().any(|(k, _)| k == &key) {
                    elem_node.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut node.borrow_mut().children);
        for child in &children {
            child.borrow_mut().parent = Some(Rc::downgrade(new_parent));
        }
        new_parent.borrow_mut().children.extend(children);
    }
}

/// Walks the tree in document order, creating one stylesheet per `<style>` element and an
/// empty placeholder per `<link rel="stylesheet">`.
fn collect_style_sheets(node: &Handle, sheets: &mut Vec<StyleSheet>) {
    if let Some(elem) = node.borrow().as_element() {
        if elem.tag.eq_ignore_ascii_case("style") {
            let css = dom_tree::text_content(node);
            sheets.push(StyleSheet::parse(&css, Some(elem.to_owner_node())));
        } else if elem.tag.eq_ignore_ascii_case("link") && is_stylesheet_link(elem) {
            sheets.push(StyleSheet::linked(
                elem.get_attribute("href").unwrap_or_default(),
                elem.to_owner_node(),
            ));
        }
    }
    for child in &node.borrow().children {
        collect_style_sheets(child, sheets);
    }
}

fn is_stylesheet_link(elem: &dom_tree::ElementNode) -> bool {
    elem.get_attribute("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}
