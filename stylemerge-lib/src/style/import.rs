//! Strict stylesheet import through `lightningcss`.
//!
//! [`RuleStore::parse`] never fails and silently drops what it cannot read.
//! `parse_strict` instead runs the text through a full CSS parser first, so
//! syntax errors are reported, `@media` blocks are flattened into the store
//! and values come back in normalized form.

use crate::error::{Error, Result};
use crate::style::rule::Rule;
use crate::style::rule_store::RuleStore;
use crate::style::selector::{Selector, SelectorSet};
use crate::style::style_set::StyleSet;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;

impl RuleStore {
    /// Parses `css_text` with a standards-compliant CSS parser.
    ///
    /// Style rules, including those nested in `@media`, become rules of the
    /// store. Other at-rules are ignored. Selectors this crate cannot match
    /// (combinators, pseudo-classes) are dropped with a warning, and so is a
    /// rule left with none.
    pub fn parse_strict(css_text: &str) -> Result<RuleStore> {
        let sheet = StyleSheet::parse(css_text, ParserOptions::default())
            .map_err(|e| Error::Import(e.to_string()))?;

        let mut store = RuleStore::new();
        for rule in &sheet.rules.0 {
            match rule {
                CssRule::Style(style_rule) => import_style_rule(style_rule, &mut store)?,
                CssRule::Media(media_rule) => {
                    for inner in &media_rule.rules.0 {
                        if let CssRule::Style(style_rule) = inner {
                            import_style_rule(style_rule, &mut store)?;
                        }
                    }
                }
                _ => log::debug!("ignoring unsupported at-rule"),
            }
        }
        Ok(store)
    }
}

fn import_style_rule(style_rule: &StyleRule<'_>, store: &mut RuleStore) -> Result<()> {
    let mut selectors = SelectorSet::new();
    for selector in &style_rule.selectors.0 {
        let text = selector
            .to_css_string(PrinterOptions::default())
            .map_err(|e| Error::Import(e.to_string()))?;
        match Selector::parse(&text) {
            Some(selector) => {
                selectors.add(selector);
            }
            None => log::warn!("dropping unsupported selector {:?}", text),
        }
    }
    if selectors.is_empty() {
        return Ok(());
    }

    let block = &style_rule.declarations;
    let mut styles = StyleSet::new();
    for property in block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
    {
        let value = property
            .value_to_css_string(PrinterOptions::default())
            .map_err(|e| Error::Import(e.to_string()))?;
        styles.set(property.property_id().name(), &value);
    }

    store.push(Rule::new(selectors, styles));
    Ok(())
}
