use crate::dom::Element;
use crate::error::{Error, Result};
use crate::named_list::{Named, NamedList};
use regex_lite::Regex;
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

/// ------------------------------
/// 1. Matchers
/// ------------------------------

/// How a tag name, attribute name or attribute value is compared.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Plain string equality.
    Exact(String),
    /// A regular expression that must match the whole text.
    Pattern(Regex),
}

impl Matcher {
    pub fn exact(text: &str) -> Self {
        Matcher::Exact(text.to_string())
    }

    /// Compiles `source` anchored at both ends.
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{})$", source))
            .map(Matcher::Pattern)
            .map_err(|e| Error::InvalidSelector(format!("/{}/: {}", source, e)))
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Exact(expected) => expected == text,
            Matcher::Pattern(regex) => regex.is_match(text),
        }
    }

    /// The pattern source as written, without the anchoring wrapper.
    fn pattern_source(regex: &Regex) -> &str {
        let anchored = regex.as_str();
        anchored
            .strip_prefix("^(?:")
            .and_then(|s| s.strip_suffix(")$"))
            .unwrap_or(anchored)
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Exact(a), Matcher::Exact(b)) => a == b,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Matcher {}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(text) => f.write_str(text),
            Matcher::Pattern(regex) => write!(f, "/{}/", Matcher::pattern_source(regex)),
        }
    }
}

/// ------------------------------
/// 2. Atomic selectors
/// ------------------------------

/// Which form a selector was written in. Decides the sigil of a generated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// `*`, or nothing at all: matches every element.
    Universal,
    /// `div`
    Tag,
    /// `.name`
    Class,
    /// `#name` or `@name`
    Id,
    /// `[attr=value]` without a class or id part.
    Attribute,
}

impl SelectorKind {
    /// The punctuation that introduces a name of this kind.
    pub fn sigil(self) -> &'static str {
        match self {
            SelectorKind::Class => ".",
            SelectorKind::Id => "#",
            _ => "",
        }
    }
}

/// One `[attr=value]` clause. A missing value only checks for presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRequirement {
    pub name: Matcher,
    pub value: Option<Matcher>,
}

/// An atomic selector: an optional tag, at most one `.class` or `#id`, and
/// any number of AND-ed attribute clauses.
///
/// The canonical text is computed once at construction; selectors compare
/// and hash through it. `@name` is accepted as an id and written back as
/// `#name`.
#[derive(Debug, Clone)]
pub struct Selector {
    text: String,
    kind: SelectorKind,
    tag: Option<Matcher>,
    name: Option<String>,
    attributes: Vec<AttributeRequirement>,
}

impl Selector {
    /// Parses one selector atom such as `div`, `.red`, `#header`, `@header`,
    /// `a[href=x][target=_blank]` or `p.note`.
    ///
    /// Returns `None` for anything outside that grammar (combinators,
    /// pseudo-classes, several classes on one atom).
    pub fn parse(selector: &str) -> Option<Selector> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let mut chars = selector.chars().peekable();
        let mut tag = None;
        let mut name = None;
        let mut kind = None;
        let mut attributes = Vec::new();

        // If first char is an identifier char, '*' or '/' assume tag.
        match chars.peek().copied() {
            Some('*') => {
                chars.next();
            }
            Some('/') => {
                chars.next();
                tag = Some(read_pattern(&mut chars)?);
            }
            Some(ch) if is_ident_char(ch) => {
                tag = Some(Matcher::Exact(read_ident(&mut chars)));
            }
            _ => {}
        }

        while let Some(ch) = chars.next() {
            match ch {
                '.' | '#' | '@' => {
                    if name.is_some() {
                        return None;
                    }
                    let ident = read_ident(&mut chars);
                    if ident.is_empty() {
                        return None;
                    }
                    kind = Some(if ch == '.' {
                        SelectorKind::Class
                    } else {
                        SelectorKind::Id
                    });
                    name = Some(ident);
                }
                '[' => attributes.push(read_attribute(&mut chars)?),
                _ => return None,
            }
        }

        let kind = kind.unwrap_or(if !attributes.is_empty() {
            SelectorKind::Attribute
        } else if tag.is_some() {
            SelectorKind::Tag
        } else {
            SelectorKind::Universal
        });
        Some(Selector::build(kind, tag, name, attributes))
    }

    pub fn universal() -> Selector {
        Selector::build(SelectorKind::Universal, None, None, Vec::new())
    }

    pub fn tag(tag: Matcher) -> Selector {
        Selector::build(SelectorKind::Tag, Some(tag), None, Vec::new())
    }

    pub fn class(name: &str) -> Selector {
        Selector::build(SelectorKind::Class, None, Some(name.to_string()), Vec::new())
    }

    /// A copy that also requires class `name`, keeping tag and attribute
    /// clauses. Selectors that already carry a class or id name get it
    /// replaced instead.
    pub fn with_class(&self, name: &str) -> Selector {
        Selector::build(
            SelectorKind::Class,
            self.tag.clone(),
            Some(name.to_string()),
            self.attributes.clone(),
        )
    }

    /// Adds an attribute clause, AND-ed with the existing ones.
    pub fn with_attribute(self, name: Matcher, value: Option<Matcher>) -> Selector {
        let mut attributes = self.attributes;
        attributes.push(AttributeRequirement { name, value });
        let kind = match self.kind {
            SelectorKind::Universal | SelectorKind::Tag => SelectorKind::Attribute,
            other => other,
        };
        Selector::build(kind, self.tag, self.name, attributes)
    }

    fn build(
        kind: SelectorKind,
        tag: Option<Matcher>,
        name: Option<String>,
        attributes: Vec<AttributeRequirement>,
    ) -> Selector {
        let mut text = String::new();
        if let Some(tag) = &tag {
            text.push_str(&tag.to_string());
        }
        if let Some(name) = &name {
            text.push_str(kind.sigil());
            text.push_str(name);
        }
        for attr in &attributes {
            text.push('[');
            text.push_str(&attr.name.to_string());
            if let Some(value) = &attr.value {
                text.push('=');
                let value = value.to_string();
                if needs_quotes(&value) {
                    text.push('"');
                    text.push_str(&value);
                    text.push('"');
                } else {
                    text.push_str(&value);
                }
            }
            text.push(']');
        }
        if text.is_empty() {
            text.push('*');
        }
        Selector {
            text,
            kind,
            tag,
            name,
            attributes,
        }
    }

    /// Canonical text, stable under re-parsing.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn tag_matcher(&self) -> Option<&Matcher> {
        self.tag.as_ref()
    }

    /// The class or id name, without its sigil.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attributes(&self) -> &[AttributeRequirement] {
        &self.attributes
    }

    /// The name this selector contributes to the stylesheet's namespace:
    /// `.name` for classes, `#name` for ids. Tags and pure attribute
    /// selectors have none.
    pub fn name_key(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{}{}", self.kind.sigil(), name))
    }

    /// A copy with the class/id name replaced, keeping tag and attribute clauses.
    /// Selectors without a name are returned unchanged.
    pub fn with_name(&self, name: &str) -> Selector {
        if self.name.is_none() {
            return self.clone();
        }
        Selector::build(
            self.kind,
            self.tag.clone(),
            Some(name.to_string()),
            self.attributes.clone(),
        )
    }

    /// A selector with no tag and no attribute requirement matches everything.
    pub fn is_wildcard(&self) -> bool {
        self.tag.is_none() && self.name.is_none() && self.attributes.is_empty()
    }

    /// Returns true if the element satisfies every clause of this selector.
    pub fn matches<E: Element + ?Sized>(&self, elem: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.matches(elem.tag_name()) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            let found = match self.kind {
                SelectorKind::Id => elem.id() == Some(name.as_str()),
                _ => elem.classes().any(|class| class == name),
            };
            if !found {
                return false;
            }
        }
        self.attributes.iter().all(|req| {
            elem.attributes().any(|(k, v)| {
                req.name.matches(k) && req.value.as_ref().map_or(true, |m| m.matches(v))
            })
        })
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty() || !value.chars().all(is_ident_char)
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut buffer = String::new();
    while let Some(&ch) = chars.peek() {
        if !is_ident_char(ch) {
            break;
        }
        buffer.push(ch);
        chars.next();
    }
    buffer
}

/// Reads a `/regex/` body; the opening slash is already consumed.
fn read_pattern(chars: &mut Peekable<Chars<'_>>) -> Option<Matcher> {
    let mut source = String::new();
    for ch in chars.by_ref() {
        if ch == '/' {
            return Matcher::pattern(&source).ok();
        }
        source.push(ch);
    }
    None
}

/// Turns one side of an attribute clause into a matcher.
fn attribute_matcher(raw: &str) -> Option<Matcher> {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
        return Matcher::pattern(&raw[1..raw.len() - 1]).ok();
    }
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Some(Matcher::exact(&raw[1..raw.len() - 1]));
        }
    }
    Some(Matcher::exact(raw))
}

/// Reads an attribute clause up to its `]`; the `[` is already consumed.
fn read_attribute(chars: &mut Peekable<Chars<'_>>) -> Option<AttributeRequirement> {
    let mut body = String::new();
    let mut quote: Option<char> = None;
    let mut closed = false;
    for ch in chars.by_ref() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ']' => {
                closed = true;
                break;
            }
            None => {}
        }
        body.push(ch);
    }
    if !closed {
        return None;
    }

    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value)),
        None => (body.trim(), None),
    };
    let name_is_pattern = name.len() >= 2 && name.starts_with('/') && name.ends_with('/');
    if name.is_empty() || !(name_is_pattern || name.chars().all(is_ident_char)) {
        return None;
    }
    Some(AttributeRequirement {
        name: attribute_matcher(name)?,
        value: match value {
            Some(value) => Some(attribute_matcher(value)?),
            None => None,
        },
    })
}

impl Named for Selector {
    fn name(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Selector {}

impl std::hash::Hash for Selector {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s).ok_or_else(|| Error::InvalidSelector(s.to_string()))
    }
}

/// Splits `text` on `separator`, ignoring separators inside quotes or
/// `[...]` clauses, so `[title="a,b"]` stays in one piece.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                _ if ch == separator && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + ch.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Canonical form of selector text, or `None` if it does not parse.
pub fn canonical(selector: &str) -> Option<String> {
    Selector::parse(selector).map(|s| s.text)
}

/// ------------------------------
/// 3. Selector sets
/// ------------------------------

/// The comma-separated alternatives of one rule. Matches when any member does.
///
/// Members are unique by canonical text and keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    selectors: NamedList<Selector>,
}

impl SelectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated selector list, skipping atoms that do not parse.
    pub fn parse(selectors: &str) -> SelectorSet {
        let mut set = SelectorSet::new();
        for part in split_top_level(selectors, ',') {
            match Selector::parse(part) {
                Some(selector) => {
                    set.add(selector);
                }
                None if part.trim().is_empty() => {}
                None => log::debug!("skipping unsupported selector {:?}", part.trim()),
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.selectors.iter()
    }

    /// True if the set holds a selector with this canonical text.
    pub fn contains(&self, canonical: &str) -> bool {
        self.selectors.contains(canonical)
    }

    /// Adds a selector; returns `false` if an equal one is already present.
    pub fn add(&mut self, selector: Selector) -> bool {
        self.selectors.insert(selector)
    }

    pub fn remove(&mut self, canonical: &str) -> Option<Selector> {
        self.selectors.remove(canonical)
    }

    /// Swaps `old` for `new` in place. If `new` is already a member, `old`
    /// is simply dropped.
    pub fn replace(&mut self, old: &str, new: Selector) -> bool {
        if !self.selectors.contains(old) {
            return false;
        }
        if self.selectors.contains(new.as_str()) {
            self.selectors.remove(old);
            return true;
        }
        self.selectors.replace(old, new)
    }

    pub fn matches<E: Element + ?Sized>(&self, elem: &E) -> bool {
        self.selectors.iter().any(|selector| selector.matches(elem))
    }
}

impl From<Selector> for SelectorSet {
    fn from(selector: Selector) -> Self {
        let mut set = SelectorSet::new();
        set.add(selector);
        set
    }
}

impl FromIterator<Selector> for SelectorSet {
    fn from_iter<I: IntoIterator<Item = Selector>>(iter: I) -> Self {
        SelectorSet {
            selectors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.iter()
    }
}

/// Equal when both hold exactly the same selectors, in any order.
impl PartialEq for SelectorSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|s| other.contains(s.as_str()))
    }
}

impl Eq for SelectorSet {}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(selector.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::ElementNode;

    fn sel(text: &str) -> Selector {
        Selector::parse(text).unwrap()
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(sel("div").kind(), SelectorKind::Tag);
        assert_eq!(sel(".red").kind(), SelectorKind::Class);
        assert_eq!(sel("#top").kind(), SelectorKind::Id);
        assert_eq!(sel("@top").kind(), SelectorKind::Id);
        assert_eq!(sel("[href=x]").kind(), SelectorKind::Attribute);
        assert_eq!(sel("*").kind(), SelectorKind::Universal);
        assert_eq!(sel("p.note").kind(), SelectorKind::Class);
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(sel(" @top ").as_str(), "#top");
        assert_eq!(sel("*.red").as_str(), ".red");
        assert_eq!(sel("a[ href = 'x y' ][target=_blank]").as_str(), r#"a[href="x y"][target=_blank]"#);
        assert_eq!(sel("[disabled]").as_str(), "[disabled]");
        assert_eq!(sel("*").as_str(), "*");
    }

    #[test]
    fn test_rejects_unsupported_forms() {
        for text in ["div p", "a > b", "a:hover", ".a.b", "#a.b", "[unterminated", ".", "a+b", ""] {
            assert!(Selector::parse(text).is_none(), "{text:?} should not parse");
        }
        assert!(matches!(
            "a b".parse::<Selector>(),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_tag_and_class_matching() {
        let elem = ElementNode::new("p").with_attribute("class", "note big");
        assert!(sel("p").matches(&elem));
        assert!(!sel("div").matches(&elem));
        assert!(sel(".note").matches(&elem));
        assert!(sel(".big").matches(&elem));
        assert!(!sel(".no").matches(&elem));
        assert!(sel("p.big").matches(&elem));
        assert!(!sel("div.big").matches(&elem));
    }

    #[test]
    fn test_id_matching() {
        let elem = ElementNode::new("div").with_attribute("id", "header");
        assert!(sel("#header").matches(&elem));
        assert!(sel("@header").matches(&elem));
        assert!(!sel("#footer").matches(&elem));
        assert!(!sel("#header").matches(&ElementNode::new("div")));
    }

    #[test]
    fn test_attribute_clauses_are_anded() {
        let elem = ElementNode::new("a")
            .with_attribute("href", "x")
            .with_attribute("target", "_blank");
        assert!(sel("[href=x]").matches(&elem));
        assert!(sel("a[href=x][target=_blank]").matches(&elem));
        assert!(!sel("a[href=x][target=_self]").matches(&elem));
        assert!(sel("[target]").matches(&elem));
        assert!(!sel("[rel]").matches(&elem));
    }

    #[test]
    fn test_wildcard_matches_everything() {
        assert!(Selector::universal().is_wildcard());
        assert!(sel("*").matches(&ElementNode::new("anything")));
    }

    #[test]
    fn test_pattern_matchers() {
        let selector = Selector::tag(Matcher::pattern("h[1-6]").unwrap())
            .with_attribute(Matcher::pattern("data-.*").unwrap(), Some(Matcher::exact("on")));
        assert!(selector.matches(&ElementNode::new("h2").with_attribute("data-x", "on")));
        assert!(!selector.matches(&ElementNode::new("h7").with_attribute("data-x", "on")));
        assert!(!selector.matches(&ElementNode::new("h2").with_attribute("data-x", "off")));
        // patterns are anchored: "h1x" is not a heading
        assert!(!Selector::tag(Matcher::pattern("h[1-6]").unwrap()).matches(&ElementNode::new("h1x")));
        // and survive a trip through their text form
        assert_eq!(sel(selector.as_str()), selector);
    }

    #[test]
    fn test_with_name_keeps_punctuation_and_clauses() {
        assert_eq!(sel("p.note[lang=en]").with_name("zz").as_str(), "p.zz[lang=en]");
        assert_eq!(sel("#a").with_name("b").as_str(), "#b");
        assert_eq!(sel("div").with_name("x").as_str(), "div");
        assert_eq!(sel("p.note").name_key().as_deref(), Some(".note"));
        assert_eq!(sel("div").name_key(), None);
    }

    #[test]
    fn test_selector_set_any_semantics() {
        let set = SelectorSet::parse("h1, .title , #main");
        assert_eq!(set.len(), 3);
        assert!(set.matches(&ElementNode::new("h1")));
        assert!(set.matches(&ElementNode::new("div").with_attribute("id", "main")));
        assert!(!set.matches(&ElementNode::new("h2")));
    }

    #[test]
    fn test_with_class_keeps_clauses() {
        assert_eq!(sel("[lang=en]").with_class("a").as_str(), ".a[lang=en]");
        assert_eq!(sel("p[lang=en]").with_class("a").kind(), SelectorKind::Class);
        assert_eq!(sel("*").with_class("a").as_str(), ".a");
    }

    #[test]
    fn test_quoted_values_keep_separators() {
        assert_eq!(
            split_top_level(r#"a[title="x,y"], .b, [data-q='{,}']"#, ','),
            vec![r#"a[title="x,y"]"#, " .b", " [data-q='{,}']"]
        );
        let set = SelectorSet::parse(r#"a[title="x,y"], .b"#);
        assert_eq!(set.len(), 2);
        assert!(set.matches(&ElementNode::new("a").with_attribute("title", "x,y")));
        assert_eq!(set.to_string(), r#"a[title="x,y"], .b"#);
    }

    #[test]
    fn test_selector_set_dedup_and_skip() {
        let set = SelectorSet::parse("#a, @a, div p, .b,");
        assert_eq!(set.to_string(), "#a, .b");
    }

    #[test]
    fn test_selector_set_equality_ignores_order() {
        assert_eq!(SelectorSet::parse(".a, .b"), SelectorSet::parse(".b,.a"));
        assert_ne!(SelectorSet::parse(".a, .b"), SelectorSet::parse(".a"));
    }

    #[test]
    fn test_selector_set_replace() {
        let mut set = SelectorSet::parse(".a, .b");
        assert!(set.replace(".a", sel(".c")));
        assert_eq!(set.to_string(), ".c, .b");
        assert!(set.replace(".c", sel(".b")));
        assert_eq!(set.to_string(), ".b");
        assert!(!set.replace(".zz", sel(".y")));
    }
}
