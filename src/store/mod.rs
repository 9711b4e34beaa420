//! Aggregation store: word occurrence counts and pairwise relationship weights
//!
//! Every mutation is an increment, never an overwrite, so replaying a batch after a crash can
//! only over-count, never corrupt. Relationships may only point at words that exist.
use crate::errors::*;
use crate::ident::WordId;

pub mod memory;
pub mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

/// Default number of units per transaction
pub const DEFAULT_BATCH_SIZE: usize = 2500;

/// A word of the universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub occurrences: u64,
}

/// A directed co-occurrence between two words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub base: WordId,
    pub target: WordId,
    pub weight: u64,
}

/// What happened to a seeded word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seeded {
    Inserted(WordId),
    /// The same text is already in the universe
    Duplicate(WordId),
    /// A different word already owns this id. The new one is not stored.
    Collision { id: WordId, existing: String },
}

/// Table sizes and counter totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub words: u64,
    pub relations: u64,
    pub occurrences: u64,
    pub weight: u64,
}

/// Persistent state of the word universe and its relationships
pub trait Store {
    /// Add a word if its text is not there yet. Never resets its count.
    fn seed_word(&mut self, text: &str) -> Result<Seeded>;

    /// Add one to a word's count, returning the new count. `None` if the word is unknown.
    fn record_occurrence(&mut self, id: WordId) -> Result<Option<u64>>;

    /// Create the pair at weight 1 or add one to it, atomically, returning the new weight.
    /// `None` (and no write) if either word is unknown.
    fn record_relationship(&mut self, base: WordId, target: WordId) -> Result<Option<u64>>;

    /// Make everything since the last commit durable
    fn commit(&mut self) -> Result<()>;

    fn word(&self, id: WordId) -> Result<Option<Word>>;

    fn relationship(&self, base: WordId, target: WordId) -> Result<Option<Relationship>>;

    fn counts(&self) -> Result<Counts>;
}

impl<'s, S: Store + ?Sized> Store for &'s mut S {
    fn seed_word(&mut self, text: &str) -> Result<Seeded> {
        (**self).seed_word(text)
    }
    fn record_occurrence(&mut self, id: WordId) -> Result<Option<u64>> {
        (**self).record_occurrence(id)
    }
    fn record_relationship(&mut self, base: WordId, target: WordId) -> Result<Option<u64>> {
        (**self).record_relationship(base, target)
    }
    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
    fn word(&self, id: WordId) -> Result<Option<Word>> {
        (**self).word(id)
    }
    fn relationship(&self, base: WordId, target: WordId) -> Result<Option<Relationship>> {
        (**self).relationship(base, target)
    }
    fn counts(&self) -> Result<Counts> {
        (**self).counts()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! Behaviour every backend shares
    use super::*;
    use crate::ident::word_id;

    pub fn seeding_is_idempotent<S: Store>(store: &mut S) {
        assert_eq!(store.seed_word("cat").unwrap(), Seeded::Inserted(word_id("cat")));
        store.record_occurrence(word_id("cat")).unwrap();
        assert_eq!(store.seed_word("cat").unwrap(), Seeded::Duplicate(word_id("cat")));
        assert_eq!(store.seed_word("CAT ").unwrap(), Seeded::Duplicate(word_id("cat")));
        store.commit().unwrap();
        let cat = store.word(word_id("cat")).unwrap().unwrap();
        assert_eq!(cat.text, "cat");
        assert_eq!(cat.occurrences, 1);
        assert_eq!(store.counts().unwrap().words, 1);
    }

    pub fn counters_only_grow<S: Store>(store: &mut S) {
        store.seed_word("sat").unwrap();
        store.seed_word("mat").unwrap();
        let (sat, mat) = (word_id("sat"), word_id("mat"));
        let mut last = 0;
        for _ in 0..5 {
            let now = store.record_occurrence(sat).unwrap().unwrap();
            assert!(now > last);
            last = now;
        }
        assert_eq!(store.record_relationship(sat, mat).unwrap(), Some(1));
        assert_eq!(store.record_relationship(sat, mat).unwrap(), Some(2));
        assert_eq!(store.record_relationship(mat, sat).unwrap(), Some(1));
        store.commit().unwrap();
        assert_eq!(store.relationship(sat, mat).unwrap().unwrap().weight, 2);
        assert_eq!(store.relationship(mat, sat).unwrap().unwrap().weight, 1);
        assert_eq!(store.counts().unwrap(),
                   Counts { words: 2, relations: 2, occurrences: 5, weight: 3 });
    }

    pub fn unknown_words_are_ignored<S: Store>(store: &mut S) {
        store.seed_word("cat").unwrap();
        let (cat, dog) = (word_id("cat"), word_id("dog"));
        assert_eq!(store.record_occurrence(dog).unwrap(), None);
        assert_eq!(store.record_relationship(cat, dog).unwrap(), None);
        assert_eq!(store.record_relationship(dog, cat).unwrap(), None);
        store.commit().unwrap();
        assert_eq!(store.relationship(cat, dog).unwrap(), None);
        assert_eq!(store.word(dog).unwrap(), None);
        assert_eq!(store.counts().unwrap().relations, 0);
    }
}
