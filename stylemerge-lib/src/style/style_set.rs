use crate::named_list::{Named, NamedList};
use crate::style::selector::split_top_level;
use std::fmt;

/// One `property: value` pair. Values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: &str, value: &str) -> Self {
        Declaration {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

impl Named for Declaration {
    fn name(&self) -> &str {
        &self.property
    }
}

/// Ordered declarations with unique property names.
///
/// Order is kept for output only: two sets are equal when they hold the
/// same (property, value) pairs, whatever the order.
#[derive(Debug, Clone, Default)]
pub struct StyleSet {
    declarations: NamedList<Declaration>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `name: value; name: value`, optionally wrapped in `{ }`.
    /// Pieces without a `:` or with an empty name are skipped.
    pub fn parse(data: &str) -> StyleSet {
        let mut styles = StyleSet::new();
        let mut data = data.trim();
        if let Some(inner) = data.strip_prefix('{') {
            data = inner.strip_suffix('}').unwrap_or(inner);
        }
        for item in split_top_level(data, ';') {
            match item.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => {
                    styles.set(name.trim(), value.trim());
                }
                _ if item.trim().is_empty() => {}
                _ => log::debug!("skipping malformed declaration {:?}", item.trim()),
            }
        }
        styles
    }

    /// Parses the contents of an inline `style="..."` attribute.
    pub fn parse_style_attribute(contents: &str) -> StyleSet {
        StyleSet::parse(contents)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations.get(property).map(|d| d.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }

    /// Sets a property, replacing any previous value in place.
    pub fn set(&mut self, property: &str, value: &str) {
        self.declarations.upsert(Declaration::new(property, value));
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.declarations.remove(property).map(|d| d.value)
    }

    /// Adds the declarations of `other` whose property is not present yet.
    /// The first writer wins.
    pub fn append(&mut self, other: &StyleSet) {
        for decl in other.iter() {
            self.declarations.insert(decl.clone());
        }
    }

    /// Adds every declaration of `other`; a property already present takes
    /// the new value but keeps its position.
    pub fn overlay(&mut self, other: &StyleSet) {
        for decl in other.iter() {
            self.declarations.upsert(decl.clone());
        }
    }

    /// The value of an inline style attribute: `name:value;name:value`.
    pub fn style_attribute(&self) -> String {
        self.iter()
            .map(|d| format!("{}:{}", d.property, d.value))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Declarations in stylesheet block form, each line prefixed by `indent`.
    pub fn css_block(&self, indent: &str) -> String {
        let mut out = format!("{}{{\n", indent);
        for decl in self.iter() {
            out.push_str(&format!("{}\t{}: {};\n", indent, decl.property, decl.value));
        }
        out.push_str(indent);
        out.push('}');
        out
    }
}

impl PartialEq for StyleSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|d| other.get(&d.property) == Some(d.value.as_str()))
    }
}

impl Eq for StyleSet {}

impl FromIterator<Declaration> for StyleSet {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        StyleSet {
            declarations: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_block(""))
    }
}
