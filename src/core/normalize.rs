//! Lexical normalization shared by every similarity check.
//!
//! Text is lowercased, punctuation becomes whitespace, and short or stop-word
//! tokens are dropped. Results are memoized per exact input string.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::trace;

/// Closed stop-word list (articles, auxiliaries, conjunctions, prepositions)
pub const STOP_WORDS: [&str; 35] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "this", "that",
];

/// Tokens with this many chars or fewer are discarded
const MIN_TOKEN_CHARS: usize = 2;

/// Default number of distinct strings kept in the cache
const DEFAULT_CAPACITY: u64 = 50_000;

/// Memoizing tokenizer
#[derive(Clone)]
pub struct TextNormalizer
{
    /// Keyed by the literal input string, not a normalized form
    cache: Cache<String, Arc<[String]>>,
}

impl Default for TextNormalizer
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl std::fmt::Debug for TextNormalizer
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.debug_struct("TextNormalizer")
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl TextNormalizer
{
    pub fn new() -> Self
    {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self
    {
        Self { cache: Cache::new(capacity) }
    }

    /// Meaningful tokens of `text`, in order of appearance
    pub fn tokens(
        &self,
        text: &str,
    ) -> Arc<[String]>
    {
        if let Some(hit) = self.cache.get(text)
        {
            return hit;
        }

        let tokens: Arc<[String]> = tokenize(text).into();
        trace!(len = tokens.len(), "normalized text");

        self.cache
            .insert(text.to_string(), Arc::clone(&tokens));

        tokens
    }

    /// Drop every cached entry
    pub fn clear(&self)
    {
        self.cache
            .invalidate_all();
    }
}

/// Uncached tokenization
pub fn tokenize(text: &str) -> Vec<String>
{
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| {
            t.chars()
                .count()
                > MIN_TOKEN_CHARS
        })
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_strips_punctuation_short_and_stop_words()
    {
        let toks = tokenize("What is the capital of France? It's Paris!");
        assert_eq!(toks, vec!["what", "capital", "france", "paris"]);
    }

    #[test]
    fn test_cache_returns_identical_sequence()
    {
        let n = TextNormalizer::new();
        let a = n.tokens("Photosynthesis converts light energy.");
        let b = n.tokens("Photosynthesis converts light energy.");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*a, &["photosynthesis", "converts", "light", "energy"]);
    }

    #[test]
    fn test_cache_key_is_literal_input()
    {
        let n = TextNormalizer::new();
        let a = n.tokens("Energy Light");
        let b = n.tokens("energy light");

        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_empty_and_symbol_only_input()
    {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?? -- !!").is_empty());
    }
}
