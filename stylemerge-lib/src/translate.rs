//! Keeps a markup tree pointing at the right rules after a rename.
//!
//! Each element is looked up in the [`RenameMap`] by its tag name, then by
//! its id (`#id`, the legacy `@id` key, then `tag#id`), then by each of its
//! class tokens (`.class`, then `tag.class`). Keys carrying attribute
//! clauses (`[lang=en]`, `p.x[lang=en]`) and `*` can't be looked up by name,
//! so they are tested against the element last. The first hit decides what
//! changes:
//!
//! * a `.name` translation replaces the matched class token, or adds the
//!   class when the hit was anything else,
//! * a `#name` translation sets the id,
//! * a bare name sets the tag.
//!
//! Only one aspect of an element is rewritten per pass. An element carrying
//! two classes that both need renaming keeps the second one.

use crate::dom::dom_tree::Document;
use crate::dom::ElementMut;
use crate::style::rule_store::RenameMap;
use crate::style::selector::{Matcher, Selector, SelectorKind};

enum Hit {
    Tag,
    Id,
    Class(String),
    Clauses,
}

fn find_hit<E: ElementMut + ?Sized>(renames: &RenameMap, elem: &E) -> Option<(Hit, String)> {
    let tag = elem.tag_name();
    if let Some(to) = renames.get(tag) {
        return Some((Hit::Tag, to.clone()));
    }
    if let Some(id) = elem.id() {
        let to = renames
            .get(&format!("#{}", id))
            .or_else(|| renames.get(&format!("@{}", id)))
            .or_else(|| renames.get(&format!("{}#{}", tag, id)));
        if let Some(to) = to {
            return Some((Hit::Id, to.clone()));
        }
    }
    for class in elem.classes() {
        let to = renames
            .get(&format!(".{}", class))
            .or_else(|| renames.get(&format!("{}.{}", tag, class)));
        if let Some(to) = to {
            return Some((Hit::Class(class.to_string()), to.clone()));
        }
    }
    for (from, to) in renames {
        let Some(selector) = Selector::parse(from) else {
            continue;
        };
        if selector.attributes().is_empty() && !selector.is_wildcard() {
            continue;
        }
        if selector.matches(elem) {
            let hit = match (selector.kind(), selector.name()) {
                (SelectorKind::Class, Some(name)) => Hit::Class(name.to_string()),
                _ => Hit::Clauses,
            };
            return Some((hit, to.clone()));
        }
    }
    None
}

/// Rewrites `elem` according to the first matching entry of `renames`.
/// Returns `false` when nothing matched.
pub fn apply_to_element<E: ElementMut + ?Sized>(renames: &RenameMap, elem: &mut E) -> bool {
    let Some((hit, to)) = find_hit(renames, elem) else {
        return false;
    };
    let Some(target) = Selector::parse(&to) else {
        log::debug!("ignoring untranslatable rename target {:?}", to);
        return false;
    };

    let removed = match &hit {
        Hit::Class(token) => Some(token.as_str()),
        _ => None,
    };
    match (target.kind(), target.name(), target.tag_matcher()) {
        (SelectorKind::Class, Some(name), _) => {
            let classes = rewrite_classes(elem, removed, Some(name));
            elem.set_attribute("class", classes);
        }
        (SelectorKind::Id, Some(name), _) => {
            if removed.is_some() {
                let classes = rewrite_classes(elem, removed, None);
                elem.set_attribute("class", classes);
            }
            elem.set_attribute("id", name.to_string());
        }
        (SelectorKind::Tag, _, Some(Matcher::Exact(tag))) => {
            if removed.is_some() {
                let classes = rewrite_classes(elem, removed, None);
                elem.set_attribute("class", classes);
            }
            elem.set_tag_name(tag);
        }
        _ => {
            log::debug!("ignoring untranslatable rename target {:?}", to);
            return false;
        }
    }
    log::trace!("translated <{}> to {}", elem.tag_name(), to);
    true
}

/// The class list with `removed` swapped for `added` (in place when both are
/// given, appended otherwise). Duplicates collapse.
fn rewrite_classes<E: ElementMut + ?Sized>(
    elem: &E,
    removed: Option<&str>,
    added: Option<&str>,
) -> String {
    let mut classes: Vec<&str> = Vec::new();
    let mut placed = false;
    for class in elem.classes() {
        let class = if Some(class) == removed {
            match added {
                Some(added) if !placed => {
                    placed = true;
                    added
                }
                _ => continue,
            }
        } else {
            class
        };
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    if let Some(added) = added {
        if !placed && !classes.contains(&added) {
            classes.push(added);
        }
    }
    classes.join(" ")
}

/// Applies [`apply_to_element`] to every element of `document`. Returns the
/// number of elements rewritten.
pub fn apply_to_document(renames: &RenameMap, document: &Document) -> usize {
    if renames.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    document.for_each_element_mut(|elem| {
        if apply_to_element(renames, elem) {
            rewritten += 1;
        }
    });
    log::debug!("translated {} elements", rewritten);
    rewritten
}
