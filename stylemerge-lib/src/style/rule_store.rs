//! The ordered rule collection behind a stylesheet.
//!
//! A [`RuleStore`] is built from stylesheet text, answers "which styles apply
//! to this element", and folds other stores into itself without letting two
//! rules claim the same selector with different styles.

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::style::naming::NameAllocator;
use crate::style::obfuscate::Obfuscator;
use crate::style::rule::Rule;
use crate::style::selector::{canonical, split_top_level, Matcher, Selector, SelectorKind, SelectorSet};
use crate::style::style_set::StyleSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Original selector text -> new selector text, as produced by
/// [`RuleStore::merge`], [`RuleStore::condense`] and [`RuleStore::obfuscate`].
pub type RenameMap = BTreeMap<String, String>;

/// Rules in stylesheet order. Later rules are applied after earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStore {
    rules: Vec<Rule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `selectors { declarations }` blocks.
    ///
    /// Best-effort: comments are stripped, blocks with nested or missing
    /// braces and blocks without a usable selector are dropped, malformed
    /// declarations are skipped. Braces inside quotes or `[...]` clauses do
    /// not delimit blocks. Never fails.
    pub fn parse(css_text: &str) -> RuleStore {
        let text = strip_comments(css_text);
        let mut blocks = split_top_level(&text, '}');
        // whatever follows the last '}' never got closed
        if let Some(tail) = blocks.pop() {
            if !tail.trim().is_empty() {
                log::debug!("dropping unterminated block {:?}", tail.trim());
            }
        }

        let mut store = RuleStore::new();
        for block in blocks {
            let &[selectors, declarations] = split_top_level(block, '{').as_slice() else {
                if !block.trim().is_empty() {
                    log::debug!("skipping malformed block {:?}", block.trim());
                }
                continue;
            };
            let selectors = SelectorSet::parse(selectors);
            if selectors.is_empty() {
                log::debug!("skipping block without a supported selector");
                continue;
            }
            store.push(Rule::new(selectors, StyleSet::parse(declarations)));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule at `index`, or [`Error::IndexNotFound`].
    pub fn get(&self, index: usize) -> Result<&Rule> {
        let len = self.rules.len();
        self.rules
            .get(index)
            .ok_or(Error::IndexNotFound { index, len })
    }

    /// Appends a rule. Rules without selectors are dropped.
    pub fn push(&mut self, rule: Rule) {
        if rule.is_empty() {
            return;
        }
        self.rules.push(rule);
    }

    pub fn has_selector(&self, selector: &str) -> bool {
        self.rule_for_selector(selector).is_some()
    }

    /// The first rule listing `selector` (compared in canonical form).
    pub fn rule_for_selector(&self, selector: &str) -> Option<&Rule> {
        let canonical = canonical(selector)?;
        self.position_of(&canonical).map(|i| &self.rules[i])
    }

    /// The first rule whose styles equal `styles`.
    pub fn rule_for_styles(&self, styles: &StyleSet) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.same_styles(styles))
    }

    fn position_of(&self, canonical: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.has_selector(canonical))
    }

    /// True if `name` is already claimed, either as a whole selector or as
    /// the class/id name of one.
    fn name_in_use(&self, name: &str) -> bool {
        self.rules.iter().flat_map(|rule| rule.selectors.iter()).any(|selector| {
            selector.as_str() == name || selector.name_key().as_deref() == Some(name)
        })
    }

    /// Rules that apply to `elem`, in stylesheet order.
    pub fn matching_rules<'a, E: Element + ?Sized>(
        &'a self,
        elem: &'a E,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| rule.matches_element(elem))
    }

    /// The styles of every matching rule, concatenated in rule order.
    ///
    /// A property set by several rules keeps the value of the last one.
    /// No specificity is computed. Empty when nothing matches.
    pub fn get_styles<E: Element + ?Sized>(&self, elem: &E) -> StyleSet {
        let mut styles = StyleSet::new();
        for rule in self.matching_rules(elem) {
            styles.overlay(&rule.styles);
        }
        styles
    }

    /// Removes `selector` from every rule, dropping rules left empty.
    /// Returns whether anything was removed.
    pub fn remove_selector(&mut self, selector: &str) -> bool {
        let Some(canonical) = canonical(selector) else {
            return false;
        };
        let mut removed = false;
        for rule in &mut self.rules {
            removed |= rule.selectors.remove(&canonical).is_some();
        }
        self.rules.retain(|rule| !rule.is_empty());
        removed
    }

    /// Rewrites selectors in place.
    ///
    /// A selector is looked up by its full canonical text first, then by its
    /// class/id name, so `.x -> .y` also turns `p.x` into `p.y`.
    pub fn apply_renames(&mut self, renames: &RenameMap) {
        if renames.is_empty() {
            return;
        }
        for rule in &mut self.rules {
            rule.selectors = rule
                .selectors
                .iter()
                .map(|selector| renamed_selector(selector, renames))
                .collect();
        }
    }

    /// A selector name derived from `seed` that no rule uses yet, with the
    /// default naming options.
    pub fn available_selector_name(&self, seed: &str) -> String {
        self.available_selector_name_with(seed, &NameAllocator::default())
    }

    pub fn available_selector_name_with(&self, seed: &str, allocator: &NameAllocator) -> String {
        allocator.allocate(seed, |name| self.name_in_use(name))
    }

    /// An unused replacement for a selector that collides with this store.
    ///
    /// Class and id selectors keep their tag and attribute clauses and only
    /// get a new name. A tag becomes a plain class seeded from the tag name.
    /// Attribute and universal selectors keep their clauses and gain a class
    /// (`[lang=en]` -> `.a[lang=en]`), so markup can be pointed at them.
    fn available_selector_for(&self, selector: &Selector, allocator: &NameAllocator) -> Selector {
        if let Some(key) = selector.name_key() {
            let key = self.available_selector_name_with(&key, allocator);
            return selector.with_name(&key[1..]);
        }
        let tag = match selector.tag_matcher() {
            Some(Matcher::Exact(tag)) => Some(tag.as_str()),
            _ => None,
        };
        if selector.kind() == SelectorKind::Tag {
            let name = self.available_selector_name_with(tag.unwrap_or(""), allocator);
            return Selector::parse(&name)
                .unwrap_or_else(|| Selector::class(name.trim_start_matches('.')));
        }
        let seed = tag.map(|tag| format!(".{}", tag)).unwrap_or_default();
        let name = self.available_selector_name_with(&seed, allocator);
        selector.with_class(name.trim_start_matches('.'))
    }

    /// Folds every rule of `incoming` into this store using the default
    /// naming options. See [`RuleStore::merge_with`].
    pub fn merge(&mut self, incoming: &RuleStore) -> RenameMap {
        self.merge_with(incoming, &NameAllocator::default())
    }

    /// Folds every rule of `incoming` into this store.
    ///
    /// Selectors already styled identically are left alone, selectors whose
    /// styles match an existing rule join it as aliases, and selectors that
    /// collide with differently styled rules move to a fresh name. A selector
    /// renamed once keeps that name for the rest of the merge, and the styles
    /// it picked up before the conflict follow it. The returned map lists
    /// exactly the incoming selectors whose name changed; apply it to the
    /// incoming markup. `incoming` is not modified.
    pub fn merge_with(&mut self, incoming: &RuleStore, allocator: &NameAllocator) -> RenameMap {
        let mut state = MergeState::new(self);
        for rule in incoming.iter() {
            self.fold_rule(rule, allocator, &mut state);
        }
        state.renames
    }

    pub fn add_rule(&mut self, rule: &Rule) -> RenameMap {
        self.add_rule_with(rule, &NameAllocator::default())
    }

    /// A single-rule [`RuleStore::merge_with`].
    pub fn add_rule_with(&mut self, rule: &Rule, allocator: &NameAllocator) -> RenameMap {
        let mut state = MergeState::new(self);
        self.fold_rule(rule, allocator, &mut state);
        state.renames
    }

    fn fold_rule(&mut self, rule: &Rule, allocator: &NameAllocator, state: &mut MergeState) {
        for selector in rule.selectors.iter() {
            let key = selector.to_string();

            if let Some(renamed) = state.renames.get(&key).and_then(|to| Selector::parse(to)) {
                self.push(Rule::single(renamed, rule.styles.clone()));
                continue;
            }

            if state.existing.contains(&key) {
                let same = self
                    .rules
                    .iter()
                    .position(|r| r.has_selector(&key) && r.same_styles(&rule.styles));
                if let Some(i) = same {
                    state.placed.entry(key).or_default().push(i);
                    continue;
                }
                let renamed = self.available_selector_for(selector, allocator);
                log::debug!("merge conflict on {}, renamed to {}", selector, renamed);
                for &i in state.placed.get(&key).into_iter().flatten() {
                    self.rules[i].selectors.add(renamed.clone());
                }
                state.existing.insert(renamed.to_string());
                state.renames.insert(key, renamed.to_string());
                self.push(Rule::single(renamed, rule.styles.clone()));
                continue;
            }

            // never alias onto a rule before one this selector already uses
            let after = state
                .placed
                .get(&key)
                .and_then(|placed| placed.last())
                .map_or(0, |&i| i + 1);
            let shared = self.rules[after..]
                .iter()
                .position(|r| r.same_styles(&rule.styles))
                .map(|i| i + after);
            let index = match shared {
                Some(i) => {
                    self.rules[i].selectors.add(selector.clone());
                    i
                }
                None => {
                    self.push(Rule::single(selector.clone(), rule.styles.clone()));
                    self.rules.len() - 1
                }
            };
            state.placed.entry(key).or_default().push(index);
        }
    }

    /// Combines rules with identical styles into one rule listing all their
    /// selectors, at the position of the first of them.
    ///
    /// Later members move up to that position, so an element matched by
    /// several rules can end up with a different value for a property the
    /// rules disagree on (`.a{color:red} .b{color:blue} .c{color:red}` gives
    /// `class="b c"` blue instead of red).
    ///
    /// With `rename`, each combined rule keeps its first plain class or id
    /// selector and every other plain class or id is mapped onto it. Tags,
    /// compound and attribute selectors stay as aliases, and so do selectors
    /// still used by another rule. Running it again on the result changes
    /// nothing.
    pub fn condense(&mut self, rename: bool) -> RenameMap {
        let mut condensed: Vec<Rule> = Vec::new();
        for rule in self.rules.drain(..) {
            match condensed.iter_mut().find(|r| r.styles == rule.styles) {
                Some(existing) => {
                    for selector in rule.selectors.iter() {
                        existing.selectors.add(selector.clone());
                    }
                }
                None => condensed.push(rule),
            }
        }
        self.rules = condensed;

        let mut renames = RenameMap::new();
        if !rename {
            return renames;
        }

        let mut usage: HashMap<String, usize> = HashMap::new();
        for selector in self.rules.iter().flat_map(|rule| rule.selectors.iter()) {
            *usage.entry(selector.to_string()).or_default() += 1;
        }
        for rule in &mut self.rules {
            let Some(keep) = rule.selectors.iter().find(|s| is_simple(s)).cloned() else {
                continue;
            };
            let redundant: Vec<Selector> = rule
                .selectors
                .iter()
                .filter(|s| *s != &keep && is_simple(s) && usage.get(s.as_str()) == Some(&1))
                .cloned()
                .collect();
            for selector in redundant {
                rule.selectors.remove(selector.as_str());
                log::debug!("condensed {} into {}", selector, keep);
                renames.insert(selector.to_string(), keep.to_string());
            }
        }
        renames
    }

    /// Replaces every class and id name with a short random one drawn from
    /// `rng`.
    ///
    /// Names listed in `ignore` (as `.name` / `#name`) keep their value and
    /// map to themselves. Every occurrence of a name gets the same
    /// replacement and no two names share one. Tags and attribute clauses are
    /// not renamed.
    pub fn obfuscate<R: Rng>(&mut self, ignore: &HashSet<String>, rng: &mut R) -> RenameMap {
        let ignore: HashSet<String> = ignore
            .iter()
            .map(|name| canonical(name).unwrap_or_else(|| name.clone()))
            .collect();
        let mut obfuscator = Obfuscator::new(rng);
        for name in &ignore {
            obfuscator.reserve(name.trim_start_matches(['.', '#']));
        }

        let mut renames = RenameMap::new();
        let mut by_name: HashMap<String, String> = HashMap::new();
        for selector in self.rules.iter().flat_map(|rule| rule.selectors.iter()) {
            let (Some(key), Some(name)) = (selector.name_key(), selector.name()) else {
                continue;
            };
            let new_name = if ignore.contains(&key) {
                name.to_string()
            } else {
                by_name
                    .entry(key.clone())
                    .or_insert_with(|| obfuscator.fresh_name())
                    .clone()
            };
            let replacement = selector.with_name(&new_name);
            renames.insert(key, format!("{}{}", selector.kind().sigil(), new_name));
            if Some(selector.to_string()) != selector.name_key() {
                renames.insert(selector.to_string(), replacement.to_string());
            }
        }
        log::debug!("obfuscated {} names", by_name.len());
        self.apply_renames(&renames);
        renames
    }

    /// [`RuleStore::obfuscate`] driven by a generator seeded with `seed`.
    pub fn obfuscate_seeded(&mut self, ignore: &HashSet<String>, seed: u64) -> RenameMap {
        let mut rng = StdRng::seed_from_u64(seed);
        self.obfuscate(ignore, &mut rng)
    }
}

/// A bare `.class` or `#id`: names markup can drop or be pointed at without
/// touching its tags.
fn is_simple(selector: &Selector) -> bool {
    matches!(selector.kind(), SelectorKind::Class | SelectorKind::Id)
        && selector.tag_matcher().is_none()
        && selector.attributes().is_empty()
}

/// What one merge has seen so far.
struct MergeState {
    /// Selectors the store already held, plus names allocated by the merge.
    existing: HashSet<String>,
    /// Rules holding each incoming selector's styles, in incoming order.
    placed: HashMap<String, Vec<usize>>,
    renames: RenameMap,
}

impl MergeState {
    fn new(store: &RuleStore) -> Self {
        MergeState {
            existing: store
                .rules
                .iter()
                .flat_map(|rule| rule.selectors.iter())
                .map(|selector| selector.to_string())
                .collect(),
            placed: HashMap::new(),
            renames: RenameMap::new(),
        }
    }
}

fn renamed_selector(selector: &Selector, renames: &RenameMap) -> Selector {
    if let Some(target) = renames.get(selector.as_str()) {
        if let Some(renamed) = Selector::parse(target) {
            return renamed;
        }
    }
    if let Some(key) = selector.name_key() {
        if let Some(target) = renames.get(&key) {
            if let Some(new_name) = target.strip_prefix(selector.kind().sigil()) {
                return selector.with_name(new_name);
            }
        }
    }
    selector.clone()
}

fn strip_comments(css_text: &str) -> String {
    let mut out = String::with_capacity(css_text.len());
    let mut rest = css_text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

impl From<Rule> for RuleStore {
    fn from(rule: Rule) -> Self {
        let mut store = RuleStore::new();
        store.push(rule);
        store
    }
}

impl FromIterator<Rule> for RuleStore {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut store = RuleStore::new();
        for rule in iter {
            store.push(rule);
        }
        store
    }
}

impl<'a> IntoIterator for &'a RuleStore {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
