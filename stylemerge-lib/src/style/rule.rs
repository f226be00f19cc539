use crate::dom::Element;
use crate::style::selector::{Selector, SelectorSet};
use crate::style::style_set::StyleSet;
use std::fmt;

/// A selector list bound to the declarations every member shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: SelectorSet,
    pub styles: StyleSet,
}

impl Rule {
    pub fn new(selectors: SelectorSet, styles: StyleSet) -> Self {
        Rule { selectors, styles }
    }

    /// A rule for a single selector.
    pub fn single(selector: Selector, styles: StyleSet) -> Self {
        Rule::new(SelectorSet::from(selector), styles)
    }

    /// Parses `selectors` and `declarations` text separately.
    pub fn parse(selectors: &str, declarations: &str) -> Self {
        Rule::new(SelectorSet::parse(selectors), StyleSet::parse(declarations))
    }

    pub fn has_selector(&self, canonical: &str) -> bool {
        self.selectors.contains(canonical)
    }

    pub fn same_styles(&self, styles: &StyleSet) -> bool {
        &self.styles == styles
    }

    /// Rule-vs-element comparison; rule-vs-rule is `==`.
    pub fn matches_element<E: Element + ?Sized>(&self, elem: &E) -> bool {
        self.selectors.matches(elem)
    }

    /// The styles this rule contributes to `elem`, if it applies at all.
    pub fn styles_for<E: Element + ?Sized>(&self, elem: &E) -> Option<&StyleSet> {
        self.matches_element(elem).then_some(&self.styles)
    }

    /// A rule whose last selector was removed must be dropped by its owner.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.selectors, self.styles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::ElementNode;

    #[test]
    fn test_rule_equality_is_structural() {
        assert_eq!(
            Rule::parse(".a, .b", "color:red;font:times"),
            Rule::parse(".b,.a", "font:times;color:red")
        );
        assert_ne!(Rule::parse(".a", "color:red"), Rule::parse(".a", "color:blue"));
        assert_ne!(Rule::parse(".a", "color:red"), Rule::parse(".b", "color:red"));
    }

    #[test]
    fn test_rule_matches_element() {
        let rule = Rule::parse("h1, .title", "font-weight:bold");
        let title = ElementNode::new("div").with_attribute("class", "title");
        assert!(rule.matches_element(&title));
        assert_eq!(rule.styles_for(&title).map(|s| s.style_attribute()), Some("font-weight:bold".to_string()));
        assert!(rule.styles_for(&ElementNode::new("p")).is_none());
    }

    #[test]
    fn test_display() {
        let rule = Rule::parse("a, .b", "color:red");
        assert_eq!(rule.to_string(), "a, .b {\n\tcolor: red;\n}");
    }
}
