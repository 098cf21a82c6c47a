//! Splits decoded text into word tokens.
//!
//! A token is a maximal run of Unicode word characters (letters, digits, underscore),
//! cut every `max_word_size` characters. Everything else separates tokens.
//! The tokenizer works on one chunk at a time: a word straddling two chunks comes out
//! as two tokens. This keeps memory bounded by the chunk size.

use regex::Regex;
use samfellu_traits::SmfResult;

#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
    max_word_size: usize,
}

impl Tokenizer {
    pub fn new(max_word_size: usize) -> SmfResult<Self> {
        if max_word_size == 0 {
            return Err("max_word_size must be at least 1.".into());
        }
        // Words are cut after matching, a bounded repetition of Unicode \w
        // outgrows the regex size limit for long words.
        let pattern = Regex::new(r"\w+").map_err(|e| format!("Invalid word pattern: {}", e))?;
        Ok(Tokenizer {
            pattern,
            max_word_size,
        })
    }

    pub fn max_word_size(&self) -> usize {
        self.max_word_size
    }

    /// Lazily yields the tokens of a chunk in document order.
    pub fn tokenize<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        let max = self.max_word_size;
        self.pattern.find_iter(text).flat_map(move |m| WordPieces {
            rest: m.as_str(),
            max,
        })
    }
}

/// Consecutive pieces of at most `max` characters of one word.
struct WordPieces<'t> {
    rest: &'t str,
    max: usize,
}

impl<'t> Iterator for WordPieces<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        if self.rest.is_empty() {
            return None;
        }
        let cut = self
            .rest
            .char_indices()
            .nth(self.max)
            .map_or(self.rest.len(), |(i, _)| i);
        let (piece, rest) = self.rest.split_at(cut);
        self.rest = rest;
        Some(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_are_dropped() {
        let t = Tokenizer::new(50).unwrap();
        let words: Vec<&str> = t.tokenize("Кот, бежит — быстро!\n(snake_case 42)").collect();
        assert_eq!(words, vec!["Кот", "бежит", "быстро", "snake_case", "42"]);
    }

    #[test]
    fn test_long_words_are_cut() {
        let t = Tokenizer::new(3).unwrap();
        let words: Vec<&str> = t.tokenize("абвгдеж ab").collect();
        assert_eq!(words, vec!["абв", "где", "ж", "ab"]);
    }

    #[test]
    fn test_large_max_word_size() {
        for max in [1000, 5000] {
            let t = Tokenizer::new(max).unwrap();
            let long = "я".repeat(2500);
            let text = format!("кот {} бежит", long);
            let words: Vec<&str> = t.tokenize(&text).collect();
            if max == 1000 {
                assert_eq!(words.len(), 5);
                assert_eq!(words[1].chars().count(), 1000);
                assert_eq!(words[3].chars().count(), 500);
            } else {
                assert_eq!(words, vec!["кот", long.as_str(), "бежит"]);
            }
        }
    }

    #[test]
    fn test_chunk_boundary_splits_words() {
        let t = Tokenizer::new(50).unwrap();
        let text = "молоко";
        let (a, b) = text.split_at("мол".len());
        let mut words: Vec<&str> = t.tokenize(a).collect();
        words.extend(t.tokenize(b));
        assert_eq!(words, vec!["мол", "око"]);
    }

    #[test]
    fn test_empty_and_invalid() {
        let t = Tokenizer::new(10).unwrap();
        assert_eq!(t.tokenize("  ...  ").count(), 0);
        assert!(Tokenizer::new(0).is_err());
    }
}
