//! Text-in, text-out pipelines over the rule store and the markup tree.
//!
//! Each pipeline loads the stylesheet text, runs one store operation and,
//! when markup is supplied, rewrites it with the resulting rename map.

use crate::config::Options;
use crate::dom::Element;
use crate::error::Result;
use crate::parser::markup;
use crate::style::naming::NameAllocator;
use crate::style::rule_store::{RenameMap, RuleStore};
use crate::style::style_set::StyleSet;
use crate::translate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The resulting stylesheet, in rule-store text form.
    pub css: String,
    /// The supplied markup, rewritten to follow `renames`.
    pub markup: Option<String>,
    pub renames: RenameMap,
}

/// Loads stylesheet text with the parser `options` asks for.
pub fn load(css: &str, options: &Options) -> Result<RuleStore> {
    if options.strict {
        RuleStore::parse_strict(css)
    } else {
        Ok(RuleStore::parse(css))
    }
}

fn finish(store: &RuleStore, markup_text: Option<&str>, renames: RenameMap) -> Outcome {
    let markup = markup_text.map(|text| {
        let document = markup::parse_markup(text);
        translate::apply_to_document(&renames, &document);
        markup::to_html(&document)
    });
    Outcome {
        css: store.to_string(),
        markup,
        renames,
    }
}

/// Folds `incoming_css` into `base_css`. The renames are applied to
/// `incoming_markup`, the document the incoming stylesheet belongs to.
pub fn merge(
    base_css: &str,
    incoming_css: &str,
    incoming_markup: Option<&str>,
    options: &Options,
) -> Result<Outcome> {
    let mut store = load(base_css, options)?;
    let incoming = load(incoming_css, options)?;
    let allocator = NameAllocator::new(&options.naming);
    let renames = store.merge_with(&incoming, &allocator);
    log::info!(
        "merged {} incoming rules into {} ({} renamed)",
        incoming.len(),
        store.len(),
        renames.len()
    );
    Ok(finish(&store, incoming_markup, renames))
}

pub fn condense(
    css: &str,
    markup: Option<&str>,
    rename: bool,
    options: &Options,
) -> Result<Outcome> {
    let mut store = load(css, options)?;
    let before = store.len();
    let renames = store.condense(rename);
    log::info!("condensed {} rules into {}", before, store.len());
    Ok(finish(&store, markup, renames))
}

/// Obfuscates every class and id not in `ignore`, seeded from
/// [`Options::seed`].
pub fn obfuscate(
    css: &str,
    markup: Option<&str>,
    ignore: &HashSet<String>,
    options: &Options,
) -> Result<Outcome> {
    let mut store = load(css, options)?;
    let mut rng = StdRng::seed_from_u64(options.seed());
    let renames = store.obfuscate(ignore, &mut rng);
    log::info!("obfuscated {} selectors", renames.len());
    Ok(finish(&store, markup, renames))
}

/// The aggregated styles `css` gives `element`.
pub fn styles_for<E: Element + ?Sized>(css: &str, element: &E, options: &Options) -> Result<StyleSet> {
    let store = load(css, options)?;
    Ok(store.get_styles(element))
}
