//! Word identifiers
//!
//! A word's id is the first 8 bytes of the MD5 digest of its lowercase UTF-8 form, read as a
//! big-endian signed integer so it fits a 64-bit INTEGER column. The same text always gets the
//! same id in every process, so joins never need a lookup. Two distinct words may collide; with
//! word lists in the hundreds of thousands that is rare enough to accept.
use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder};
use md5::{Digest, Md5};

/// Id of a word in the word universe
pub type WordId = i64;

/// The canonical form of a word: lowercase, no surrounding whitespace
pub fn canonical(word: &str) -> Cow<str> {
    let trimmed = word.trim();
    if trimmed.chars().any(char::is_uppercase) {
        Cow::Owned(trimmed.to_lowercase())
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Deterministic id of a word
pub fn word_id(word: &str) -> WordId {
    let digest = Md5::digest(canonical(word).as_bytes());
    BigEndian::read_i64(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids() {
        assert_eq!(word_id("invisible"), 5497093784593092337);
        assert_eq!(word_id("cat"), -3425002613979437298);
        assert_eq!(word_id("sat"), 6046123504638796607);
        assert_eq!(word_id("mat"), 5342832195637425161);
        assert_eq!(word_id(""), -3162216497309240828);
    }

    #[test]
    fn case_and_padding_do_not_matter() {
        assert_eq!(word_id("Cat"), word_id("cat"));
        assert_eq!(word_id("  CAT\n"), word_id("cat"));
    }

    #[test]
    fn stable_across_calls() {
        let first = word_id("flexicon");
        for _ in 0..10 {
            assert_eq!(word_id("flexicon"), first);
        }
        assert_ne!(word_id("flexicon"), word_id("lexicon"));
    }

    #[test]
    fn canonical_borrows_when_possible() {
        match canonical("plain") {
            Cow::Borrowed(s) => assert_eq!(s, "plain"),
            Cow::Owned(_) => panic!("lowercase input should not allocate"),
        }
        assert_eq!(canonical(" Über "), "über");
    }
}
