//! Options shared by the pipelines and the command line.

/// Alphabets and separator used when a merge has to invent a selector name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    /// Placed between a suggested name and its generated suffix, e.g. `.x_a`.
    pub separator: String,
    /// Symbols for the first suffix column.
    pub first_alphabet: String,
    /// Symbols for every following suffix column.
    pub other_alphabet: String,
}

impl Default for NamingOptions {
    fn default() -> Self {
        NamingOptions {
            separator: "_".to_string(),
            first_alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            other_alphabet: "123456789abcdefghijklmnopqrstuvwxyz".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub naming: NamingOptions,
    /// Route stylesheet text through lightningcss instead of the lenient parser.
    pub strict: bool,
    /// Seed for obfuscation; `None` uses 0 so runs stay reproducible.
    pub seed: Option<u64>,
}

impl Options {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(0)
    }
}
