//! Stylesheets as structured, queryable values.
//!
//! `stylemerge_lib` parses selector/declaration blocks into a [`RuleStore`],
//! matches atomic selectors against markup elements, and keeps stylesheets
//! collision-free when they are merged, condensed or obfuscated. Every
//! renaming operation returns a [`RenameMap`] that [`translate`] applies to a
//! markup tree so the markup keeps pointing at the right rules.
//!
//! ```
//! use stylemerge_lib::dom::dom_tree::ElementNode;
//! use stylemerge_lib::RuleStore;
//!
//! let store = RuleStore::parse("a { color: red } a { font: times }");
//! let styles = store.get_styles(&ElementNode::new("a"));
//! assert_eq!(styles.style_attribute(), "color:red;font:times");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod generate;
pub mod named_list;
pub mod parser;
pub mod style;
pub mod translate;

pub use config::{NamingOptions, Options};
pub use error::{Error, Result};
pub use style::rule::Rule;
pub use style::rule_store::{RenameMap, RuleStore};
pub use style::selector::{Matcher, Selector, SelectorKind, SelectorSet};
pub use style::style_set::{Declaration, StyleSet};
