use html5ever::namespace_url;
use html5ever::ns;
use html5ever::{LocalName, QualName};
use std::cell::RefCell;
use std::rc::Rc;

/// What selector matching needs from a markup element: a tag name and a
/// name -> value attribute mapping. Nothing else about markup is assumed.
pub trait Element {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_>;

    fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Whitespace-separated tokens of the `class` attribute.
    fn classes(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self.attribute("class") {
            Some(class) => Box::new(class.split_whitespace()),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Elements the translation applier can rewrite.
pub trait ElementMut: Element {
    fn set_tag_name(&mut self, name: &str);
    fn set_attribute(&mut self, name: &str, value: String);
}

pub mod dom_tree {
    use super::*;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<Rc<RefCell<Node>>>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order.
        pub attributes: Vec<(String, String)>,
        pub children: Vec<Rc<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Rc<RefCell<Node>>,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl ElementNode {
        /// A detached HTML element with no attributes.
        pub fn new(tag: &str) -> Self {
            ElementNode {
                tag: tag.to_string(),
                qual_name: QualName::new(None, ns!(html), LocalName::from(tag)),
                attributes: Vec::new(),
                children: Vec::new(),
            }
        }

        pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
            self.set_attribute(name, value.to_string());
            self
        }
    }

    impl Element for ElementNode {
        fn tag_name(&self) -> &str {
            &self.tag
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
            Box::new(self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }
    }

    impl ElementMut for ElementNode {
        fn set_tag_name(&mut self, name: &str) {
            self.tag = name.to_string();
            self.qual_name.local = LocalName::from(name);
        }

        fn set_attribute(&mut self, name: &str, value: String) {
            match self.attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value,
                None => self.attributes.push((name.to_string(), value)),
            }
        }
    }

    impl Document {
        /// Visits every element in document order.
        pub fn for_each_element_mut<F: FnMut(&mut ElementNode)>(&self, mut visit: F) {
            visit_node(&self.root, &mut visit);
        }

        /// Concatenated text of every `<style>` element.
        pub fn style_text(&self) -> String {
            let mut css = String::new();
            self.for_each_element_mut(|elem| {
                if elem.tag.eq_ignore_ascii_case("style") {
                    for child in &elem.children {
                        if let Node::Text(text) = &*child.borrow() {
                            css.push_str(text);
                        }
                    }
                    css.push('\n');
                }
            });
            css
        }

        /// Replaces the contents of the first `<style>` element with `css`.
        /// Returns `false` when the document has no `<style>` element.
        pub fn replace_style_text(&self, css: &str) -> bool {
            let mut replaced = false;
            self.for_each_element_mut(|elem| {
                if !replaced && elem.tag.eq_ignore_ascii_case("style") {
                    elem.children = vec![Rc::new(RefCell::new(Node::Text(css.to_string())))];
                    replaced = true;
                }
            });
            replaced
        }
    }

    fn visit_node<F: FnMut(&mut ElementNode)>(node: &Rc<RefCell<Node>>, visit: &mut F) {
        let mut node_borrow = node.borrow_mut();
        match &mut *node_borrow {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    visit_node(child, visit);
                }
            }
            Node::Element(elem) => {
                visit(elem);
                for child in &elem.children {
                    visit_node(child, visit);
                }
            }
            Node::Text(_) => {}
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }
}
