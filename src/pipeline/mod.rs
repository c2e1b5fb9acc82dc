//! Token preprocessing pipeline: tokenize, lowercase, stop-word filter,
//! stem. Lazy and restartable; a downstream consumer that stops iterating
//! short-circuits the upstream stages.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// The closed stop-word set. Process-wide and immutable; initialized
/// before any indexing runs.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
        "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
        "these", "they", "this", "to", "was", "were", "will", "with", "i", "me", "my", "mine",
        "we", "us", "our", "ours", "you", "your", "yours", "he", "him", "his", "she", "her",
        "hers", "himself", "herself",
    ]
    .into_iter()
    .collect()
});

/// Maximal runs of letter/digit code points; everything else separates.
struct RawTokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> RawTokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for RawTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.text[self.pos..];
        let mut start = None;

        for (i, ch) in rest.char_indices() {
            if ch.is_alphanumeric() {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(s) = start {
                // resume at the separator; the next call skips past it
                self.pos += i;
                return Some(&rest[s..i]);
            }
        }

        self.pos = self.text.len();
        start.map(|s| &rest[s..])
    }
}

/// Turns raw text into a sequence of normalized index terms.
pub struct Pipeline {
    stemmer: Stemmer,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Lazy term sequence over `text`. Calling this again on the same
    /// input produces an equivalent sequence.
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        RawTokens::new(text)
            .map(|token| token.to_lowercase())
            .filter(|token| !STOP_WORDS.contains(token.as_str()))
            .map(|token| self.stemmer.stem(&token).into_owned())
    }

    /// Eager variant for callers that need the whole term list.
    pub fn collect_terms(&self, text: &str) -> Vec<String> {
        self.terms(text).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
