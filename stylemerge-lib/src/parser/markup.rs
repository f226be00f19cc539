//! Parsing HTML into the crate's DOM tree and writing it back out.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module. The tree is what the translation applier
//! rewrites after a merge, condense or obfuscation.

use crate::dom::dom_tree;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

/// Void elements never get a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "meta", "img", "br", "hr", "input", "link", "area", "base", "col", "embed", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Parses an HTML document into a `dom_tree::Document`.
pub fn parse_markup(html_content: &str) -> dom_tree::Document {
    let tree_sink = MarkupTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// Serializes a document, including its DOCTYPE, back to HTML text.
pub fn to_html(document: &dom_tree::Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = &*document.doctype.borrow() {
        let _ = write!(out, "<!DOCTYPE {}>", doctype.name);
    }
    write_node(&document.root.borrow(), false, &mut out);
    out
}

fn write_node(node: &dom_tree::Node, raw_text: bool, out: &mut String) {
    match node {
        dom_tree::Node::DocumentRoot(root) => {
            for child in &root.children {
                write_node(&child.borrow(), false, out);
            }
        }
        dom_tree::Node::Element(elem) => {
            let _ = write!(out, "<{}", elem.tag);
            for (k, v) in &elem.attributes {
                let _ = write!(out, " {}=\"{}\"", k, escape(v, true));
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str());
            for child in &elem.children {
                write_node(&child.borrow(), raw, out);
            }
            let _ = write!(out, "</{}>", elem.tag);
        }
        dom_tree::Node::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape(text, false));
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' if !attribute => escaped.push_str("&lt;"),
            '>' if !attribute => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A TreeSink building the DOM tree used by the translation applier.
///
/// It holds the Document being built, a stack of open nodes, and the current quirks mode.
pub struct MarkupTreeSink {
    document: dom_tree::Document,
    stack: RefCell<Vec<Rc<RefCell<dom_tree::Node>>>>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for MarkupTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupTreeSink {
    pub fn new() -> Self {
        let document = dom_tree::new_document();
        let root = document.root.clone();
        Self {
            document,
            stack: RefCell::new(vec![root]),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }
}

#[derive(Debug)]
pub struct MarkupElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for MarkupElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for MarkupTreeSink {
    type Handle = Rc<RefCell<dom_tree::Node>>;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = MarkupElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        log::debug!("markup parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            dom_tree::Node::Element(elem) => MarkupElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of handles it created as elements
            _ => MarkupElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect::<Vec<_>>();
        let element_node = dom_tree::ElementNode {
            tag: name.local.to_string(),
            qual_name: name,
            attributes,
            children: Vec::new(),
        };
        Rc::new(RefCell::new(dom_tree::Node::Element(element_node)))
    }

    /// Comments are dropped: they become empty text nodes.
    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(dom_tree::Node::Text(String::new())))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(dom_tree::Node::Text(String::new())))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let child_node = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                // Merge adjacent text so a <style> body stays one node.
                if let dom_tree::Node::Element(ref mut elem) = *parent.borrow_mut() {
                    if let Some(last) = elem.children.last() {
                        if let dom_tree::Node::Text(ref mut existing) = *last.borrow_mut() {
                            existing.push_str(&text);
                            return;
                        }
                    }
                }
                Rc::new(RefCell::new(dom_tree::Node::Text(text.to_string())))
            }
        };

        match &mut *parent.borrow_mut() {
            dom_tree::Node::DocumentRoot(root) => root.children.push(child_node.clone()),
            dom_tree::Node::Element(element) => element.children.push(child_node.clone()),
            dom_tree::Node::Text(_) => {}
        }
        let is_element = matches!(*child_node.borrow(), dom_tree::Node::Element(_));
        if is_element {
            self.stack.borrow_mut().push(child_node);
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
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

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {
        self.stack.borrow_mut().pop();
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

    fn append_before_sibling(&self, _sibling: &Self::Handle, _child: NodeOrText<Self::Handle>) {}

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let dom_tree::Node::Element(elem_node) = &mut *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem_node.attributes.iter().any(|(k, _)| k == &key) {
                    elem_node.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, _target: &Self::Handle) {}

    fn reparent_children(&self, _node: &Self::Handle, _new_parent: &Self::Handle) {}
}
