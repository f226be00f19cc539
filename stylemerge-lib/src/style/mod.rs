pub mod import;
pub mod naming;
pub mod obfuscate;
pub mod rule;
pub mod rule_store;
pub mod selector;
pub mod style_set;
