//! Ordered character sets for minifont-core.

use std::collections::HashSet;
use std::fmt;

/// The distinct characters of some text, in order of first occurrence.
///
/// This is the hand-off value between the HTML harvest and the font pipeline:
/// every Unicode scalar value the site renders, exactly once. Deduplication is
/// codepoint-level, so a multi-codepoint cluster (say a flag emoji) contributes
/// each of its scalars separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharSet {
    chars: String,
}

impl CharSet {
    /// Collect the distinct characters of `text`, keeping the order in which
    /// they first appear.
    pub fn from_text(text: &str) -> Self {
        let mut seen = HashSet::new();
        let mut chars = String::new();
        for ch in text.chars() {
            if seen.insert(ch) {
                chars.push(ch);
            }
        }
        Self { chars }
    }

    /// The deduplicated characters joined back into a single string.
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    /// Iterate the characters in first-occurrence order.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.chars()
    }

    /// Number of distinct characters.
    pub fn char_count(&self) -> usize {
        self.chars.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(ch)
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chars)
    }
}
