//! Turn raw document text into word tokens
//!
//! Order matters: lowercase, drop digit runs, drop everything that is neither a word character
//! nor whitespace, then split on whitespace. Stopwords and one-character tokens are removed
//! afterwards. Token order is preserved because the co-occurrence window depends on it.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::errors::*;
use crate::farm::{new_farm_set, FarmSet};
use crate::ident::{word_id, WordId};

lazy_static! {
    static ref DIGIT_RUNS: Regex = Regex::new(r"\d+").unwrap();
    static ref NOT_WORD_OR_SPACE: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Stopwords used when none are given on the command line
const BUILTIN_STOPWORDS: &str = include_str!("stopwords.txt");

pub type Stopwords = FarmSet<String>;

/// Read stopwords from newline separated text
pub fn parse_stopwords(text: &str) -> Stopwords {
    let mut stopwords = new_farm_set();
    for line in text.lines() {
        let word = line.trim();
        if !word.is_empty() {
            stopwords.insert(word.to_lowercase());
        }
    }
    stopwords
}

/// The English stopwords compiled into the binary
pub fn builtin_stopwords() -> Stopwords {
    parse_stopwords(BUILTIN_STOPWORDS)
}

/// Load a stopword file, one word per line
pub fn load_stopwords<P: AsRef<Path>>(path: P) -> Result<Stopwords> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::MissingFile("stopword list", path.to_path_buf(), Some(e)))?;
    let mut stopwords = new_farm_set();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            stopwords.insert(word.to_lowercase());
        }
    }
    info!("Loaded {} stopwords from {}", stopwords.len(), path.display());
    Ok(stopwords)
}

/// Normalizes documents into token sequences
pub struct Normalizer {
    stopwords: Stopwords,
}

impl Default for Normalizer {
    fn default() -> Normalizer {
        Normalizer::new(builtin_stopwords())
    }
}

impl Normalizer {
    pub fn new(stopwords: Stopwords) -> Normalizer {
        Normalizer { stopwords }
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Surviving tokens, in document order
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let no_digits = DIGIT_RUNS.replace_all(&lower, "");
        let cleaned = NOT_WORD_OR_SPACE.replace_all(&no_digits, "");
        cleaned
            .trim()
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(str::to_owned)
            .collect()
    }

    /// Ids of the surviving tokens, in document order
    pub fn ids(&self, text: &str) -> Vec<WordId> {
        self.tokens(text).iter().map(|token| word_id(token)).collect()
    }

    fn keep(&self, token: &str) -> bool {
        // Counted in characters, not bytes
        token.chars().nth(1).is_some() && !self.stopwords.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(stopwords: &str) -> Normalizer {
        Normalizer::new(parse_stopwords(stopwords))
    }

    #[test]
    fn the_cat_sat_on_the_mat() {
        let n = normalizer("the\non\n");
        assert_eq!(n.tokens("the cat sat on the mat"), vec!["cat", "sat", "mat"]);
        assert_eq!(n.ids("the cat sat on the mat"),
                   vec![word_id("cat"), word_id("sat"), word_id("mat")]);
    }

    #[test]
    fn digits_and_punctuation_are_removed_in_place() {
        let n = normalizer("");
        assert_eq!(n.tokens("Hello, World! 42 times... don't x2y"),
                   vec!["hello", "world", "times", "dont", "xy"]);
    }

    #[test]
    fn short_tokens_are_dropped() {
        let n = normalizer("");
        assert_eq!(n.tokens("a b cd e 7 ég é"), vec!["cd", "ég"]);
    }

    #[test]
    fn stopwords_match_after_lowercasing() {
        let n = normalizer("The\n  And \n\n");
        assert_eq!(n.tokens("THE fox AND the hound"), vec!["fox", "hound"]);
    }

    #[test]
    fn empty_and_blank_documents() {
        let n = Normalizer::default();
        assert!(n.tokens("").is_empty());
        assert!(n.tokens("   \n\t 123 ,,, ").is_empty());
    }

    #[test]
    fn builtin_list_has_common_words() {
        let stopwords = builtin_stopwords();
        assert!(stopwords.len() > 100);
        assert!(stopwords.contains("the"));
        assert!(stopwords.contains("about"));
        assert!(!stopwords.contains("equation"));
    }

    #[test]
    fn missing_stopword_file() {
        match load_stopwords("/definitely/not/here/stopwords.txt") {
            Err(Error::MissingFile(what, _, _)) => assert_eq!(what, "stopword list"),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("a missing file cannot load"),
        }
    }
}
