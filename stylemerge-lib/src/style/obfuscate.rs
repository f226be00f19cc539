//! Short opaque replacement names for classes and ids.

use rand::Rng;
use std::collections::HashSet;

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const OTHER_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Draws collision-free names from an injected random source.
///
/// A name starts as one random letter; while it collides with a name already
/// handed out (or reserved), one more random letter or digit is appended.
/// Reusing the same seeded generator reproduces the same names.
pub struct Obfuscator<'r, R: Rng> {
    rng: &'r mut R,
    used: HashSet<String>,
}

impl<'r, R: Rng> Obfuscator<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Obfuscator {
            rng,
            used: HashSet::new(),
        }
    }

    /// Keeps `name` from ever being generated.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// A name not returned or reserved before in this session.
    pub fn fresh_name(&mut self) -> String {
        let mut name = String::new();
        name.push(FIRST_CHARS[self.rng.gen_range(0..FIRST_CHARS.len())] as char);
        while self.used.contains(&name) {
            name.push(OTHER_CHARS[self.rng.gen_range(0..OTHER_CHARS.len())] as char);
        }
        self.used.insert(name.clone());
        name
    }
}
