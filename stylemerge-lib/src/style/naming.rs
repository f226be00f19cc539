//! Deterministic selector-name suggestions.
//!
//! When a merge finds the same selector with different styles, the incoming
//! rule is moved to a fresh name derived from the original one. Suffixes are
//! a mixed-radix counter: the first column walks `first_alphabet`, every
//! further column walks `other_alphabet`, shorter suffixes first and
//! lexicographic within one length. With the defaults that is
//! `a..z, a1..az, b1..bz, .., z1..zz, a11, ..`.

use crate::config::NamingOptions;

/// Hands out selector names that are not yet taken.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    separator: String,
    first: Vec<char>,
    other: Vec<char>,
}

impl Default for NameAllocator {
    fn default() -> Self {
        NameAllocator::new(&NamingOptions::default())
    }
}

impl NameAllocator {
    pub fn new(options: &NamingOptions) -> Self {
        let defaults = NamingOptions::default();
        let mut first: Vec<char> = options.first_alphabet.chars().collect();
        let mut other: Vec<char> = options.other_alphabet.chars().collect();
        if first.is_empty() {
            log::warn!("empty first naming alphabet, using the default");
            first = defaults.first_alphabet.chars().collect();
        }
        if other.is_empty() {
            log::warn!("empty naming alphabet, using the default");
            other = defaults.other_alphabet.chars().collect();
        }
        NameAllocator {
            separator: options.separator.clone(),
            first,
            other,
        }
    }

    /// Returns the first name derived from `seed` for which `is_taken` is false.
    ///
    /// * `""` asks for a class name, `"."`/`"#"` for a class/id of any name.
    /// * A bare tag name is returned as-is when free; when taken it becomes a
    ///   class (`p` -> `.p`), tags are never invented.
    /// * Otherwise the seed itself is tried first, then
    ///   `seed + separator + suffix` for each suffix in order.
    ///
    /// The result depends only on `seed` and `is_taken`, so an unchanged
    /// store always yields the same name.
    pub fn allocate<F: Fn(&str) -> bool>(&self, seed: &str, is_taken: F) -> String {
        let mut seed = seed.trim().to_string();
        if seed.is_empty() {
            seed.push('.');
        }
        if let Some(rest) = seed.strip_prefix('@') {
            seed = format!("#{}", rest);
        }

        let bare = seed == "." || seed == "#";
        if !bare {
            if !seed.starts_with(['.', '#']) {
                if !is_taken(&seed) {
                    return seed;
                }
                seed.insert(0, '.');
            }
            if !is_taken(&seed) {
                return seed;
            }
        }

        let mut index = 0;
        loop {
            let suffix = self.suffix_at(index);
            let candidate = if bare {
                format!("{}{}", seed, suffix)
            } else {
                format!("{}{}{}", seed, self.separator, suffix)
            };
            if !is_taken(&candidate) {
                log::debug!("allocated {:?} for seed {:?}", candidate, seed);
                return candidate;
            }
            index += 1;
        }
    }

    /// The `index`-th suffix in enumeration order.
    pub fn suffix_at(&self, index: usize) -> String {
        let mut remaining = index;
        let mut length = 1;
        let mut block = self.first.len();
        while remaining >= block {
            remaining -= block;
            block = block.saturating_mul(self.other.len());
            length += 1;
        }

        let mut tail = Vec::with_capacity(length - 1);
        for _ in 1..length {
            tail.push(self.other[remaining % self.other.len()]);
            remaining /= self.other.len();
        }
        let mut suffix = String::with_capacity(length);
        suffix.push(self.first[remaining]);
        suffix.extend(tail.iter().rev());
        suffix
    }
}
