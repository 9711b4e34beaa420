//! Volatile in-process store, for dry runs
use crate::errors::*;
use crate::farm::{new_farm, new_plain, FarmMap, PlainMap};
use crate::ident::{canonical, word_id, WordId};
use super::{Counts, Relationship, Seeded, Store, Word};

/// Keeps everything in hash maps. Commits only count batches.
#[derive(Default)]
pub struct MemoryStore {
    words: PlainMap<WordId, Word>,
    relations: FarmMap<(WordId, WordId), u64>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            words: new_plain(),
            relations: new_farm(),
            commits: 0,
        }
    }

    /// Number of batches committed so far
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl Store for MemoryStore {
    fn seed_word(&mut self, text: &str) -> Result<Seeded> {
        let text = canonical(text);
        let id = word_id(&text);
        if let Some(known) = self.words.get(&id) {
            return Ok(if known.text == text {
                Seeded::Duplicate(id)
            } else {
                Seeded::Collision { id, existing: known.text.clone() }
            });
        }
        self.words.insert(id, Word { id, text: text.into_owned(), occurrences: 0 });
        Ok(Seeded::Inserted(id))
    }

    fn record_occurrence(&mut self, id: WordId) -> Result<Option<u64>> {
        Ok(self.words.get_mut(&id).map(|word| {
            word.occurrences += 1;
            word.occurrences
        }))
    }

    fn record_relationship(&mut self, base: WordId, target: WordId) -> Result<Option<u64>> {
        if !self.words.contains_key(&base) || !self.words.contains_key(&target) {
            return Ok(None);
        }
        let weight = self.relations.entry((base, target)).or_insert(0);
        *weight += 1;
        Ok(Some(*weight))
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }

    fn word(&self, id: WordId) -> Result<Option<Word>> {
        Ok(self.words.get(&id).cloned())
    }

    fn relationship(&self, base: WordId, target: WordId) -> Result<Option<Relationship>> {
        Ok(self.relations.get(&(base, target))
            .map(|&weight| Relationship { base, target, weight }))
    }

    fn counts(&self) -> Result<Counts> {
        Ok(Counts {
            words: self.words.len() as u64,
            relations: self.relations.len() as u64,
            occurrences: self.words.values().map(|w| w.occurrences).sum(),
            weight: self.relations.values().sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests as shared;

    #[test]
    fn seeding_is_idempotent() {
        shared::seeding_is_idempotent(&mut MemoryStore::new());
    }

    #[test]
    fn counters_only_grow() {
        shared::counters_only_grow(&mut MemoryStore::new());
    }

    #[test]
    fn unknown_words_are_ignored() {
        shared::unknown_words_are_ignored(&mut MemoryStore::new());
    }

    #[test]
    fn collisions_keep_the_first_word() {
        let mut store = MemoryStore::new();
        let id = word_id("cat");
        store.words.insert(id, Word { id, text: "impostor".to_string(), occurrences: 3 });
        assert_eq!(store.seed_word("cat").unwrap(),
                   Seeded::Collision { id, existing: "impostor".to_string() });
        assert_eq!(store.word(id).unwrap().unwrap().occurrences, 3);
    }

    #[test]
    fn commits_are_counted() {
        let mut store = MemoryStore::new();
        store.commit().unwrap();
        store.commit().unwrap();
        assert_eq!(store.commits(), 2);
    }
}
