//! SQLite-backed aggregation store
//!
//! Schema:
//!
//! ```text
//! words(id INTEGER PRIMARY KEY, word TEXT UNIQUE, instances INTEGER DEFAULT 0)
//! relations(baseId, targetId REFERENCES words(id), instances INTEGER DEFAULT 0,
//!           PRIMARY KEY(baseId, targetId))
//! ```
//!
//! Each increment is a single statement that resolves its own conflict, so a second writer on
//! the same file can't lose updates. Mutations open a transaction lazily and `commit` closes it.
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::*;
use crate::ident::{canonical, word_id, WordId};
use super::{Counts, Relationship, Seeded, Store, Word};

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS words (
        id        INTEGER PRIMARY KEY,
        word      TEXT NOT NULL UNIQUE,
        instances INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS relations (
        baseId    INTEGER NOT NULL REFERENCES words(id),
        targetId  INTEGER NOT NULL REFERENCES words(id),
        instances INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (baseId, targetId)
    ) WITHOUT ROWID;
";

const INSERT_WORD: &str =
    "INSERT INTO words (id, word) VALUES (?1, ?2) ON CONFLICT DO NOTHING";

const INCREMENT_WORD: &str =
    "UPDATE words SET instances = instances + 1 WHERE id = ?1 RETURNING instances";

// The WHERE clause keeps dangling pairs out and also tells the parser that ON starts the upsert.
const UPSERT_RELATION: &str = "
    INSERT INTO relations (baseId, targetId, instances)
        SELECT ?1, ?2, 1
        WHERE EXISTS (SELECT 1 FROM words WHERE id = ?1)
          AND EXISTS (SELECT 1 FROM words WHERE id = ?2)
    ON CONFLICT (baseId, targetId) DO UPDATE
        SET instances = instances + 1
    RETURNING instances";

/// How long to wait on a file locked by another run
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The persistent store
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
    in_batch: bool,
}

impl SqliteStore {
    /// Open (or create) a store file. `:memory:` opens a private in-memory database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return SqliteStore::in_memory();
        }
        let conn = Connection::open(path)?;
        let store = SqliteStore { conn, path: Some(path.to_path_buf()), in_batch: false };
        store.initialize()?;
        info!("Connection established to database: {}", path.display());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn, path: None, in_batch: false };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref().map(|p| p.as_path())
    }

    fn initialize(&self) -> Result<()> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;")?;
        if self.path.is_some() {
            let mode: String = self.conn.pragma_update_and_check(
                None, "journal_mode", "WAL", |row| row.get(0))?;
            if !mode.eq_ignore_ascii_case("wal") {
                debug!("Journal mode stays {} for this database", mode);
            }
        }
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// SQLite rolls the whole transaction back by itself on some errors (full disk, I/O,
    /// out of memory). The connection is then back in autocommit mode and the batch is gone.
    fn batch_lost(&mut self) -> bool {
        if self.in_batch && self.conn.is_autocommit() {
            warn!("SQLite rolled back the current batch; its changes are lost");
            self.in_batch = false;
            return true;
        }
        false
    }

    fn begin(&mut self) -> Result<()> {
        self.batch_lost();
        if !self.in_batch {
            self.conn.execute_batch("BEGIN")?;
            self.in_batch = true;
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn seed_word(&mut self, text: &str) -> Result<Seeded> {
        let text = canonical(text).into_owned();
        let id = word_id(&text);
        self.begin()?;
        let inserted = self.conn.prepare_cached(INSERT_WORD)?
            .execute(params![id, text])?;
        if inserted > 0 {
            return Ok(Seeded::Inserted(id));
        }
        let existing: Option<String> = self.conn
            .query_row("SELECT word FROM words WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        match existing {
            Some(ref known) if *known == text => Ok(Seeded::Duplicate(id)),
            Some(known) => Ok(Seeded::Collision { id, existing: known }),
            None => Err(Error::Other(format!(
                "'{}' is stored under an id other than {}; was this table built elsewhere?",
                text, id))),
        }
    }

    fn record_occurrence(&mut self, id: WordId) -> Result<Option<u64>> {
        self.begin()?;
        let count: Option<i64> = self.conn.prepare_cached(INCREMENT_WORD)?
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        Ok(count.map(|c| c as u64))
    }

    fn record_relationship(&mut self, base: WordId, target: WordId) -> Result<Option<u64>> {
        self.begin()?;
        let weight: Option<i64> = self.conn.prepare_cached(UPSERT_RELATION)?
            .query_row(params![base, target], |row| row.get(0))
            .optional()?;
        Ok(weight.map(|w| w as u64))
    }

    fn commit(&mut self) -> Result<()> {
        self.batch_lost();
        if self.in_batch {
            self.conn.execute_batch("COMMIT")?;
            self.in_batch = false;
        }
        Ok(())
    }

    fn word(&self, id: WordId) -> Result<Option<Word>> {
        Ok(self.conn
            .query_row(
                "SELECT id, word, instances FROM words WHERE id = ?1",
                params![id],
                |row| Ok(Word {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    occurrences: row.get::<_, i64>(2)? as u64,
                }))
            .optional()?)
    }

    fn relationship(&self, base: WordId, target: WordId) -> Result<Option<Relationship>> {
        Ok(self.conn
            .query_row(
                "SELECT baseId, targetId, instances FROM relations \
                 WHERE baseId = ?1 AND targetId = ?2",
                params![base, target],
                |row| Ok(Relationship {
                    base: row.get(0)?,
                    target: row.get(1)?,
                    weight: row.get::<_, i64>(2)? as u64,
                }))
            .optional()?)
    }

    fn counts(&self) -> Result<Counts> {
        Ok(self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM words),
                    (SELECT COUNT(*) FROM relations),
                    (SELECT COALESCE(SUM(instances), 0) FROM words),
                    (SELECT COALESCE(SUM(instances), 0) FROM relations)",
            [],
            |row| Ok(Counts {
                words: row.get::<_, i64>(0)? as u64,
                relations: row.get::<_, i64>(1)? as u64,
                occurrences: row.get::<_, i64>(2)? as u64,
                weight: row.get::<_, i64>(3)? as u64,
            }))?)
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if !self.batch_lost() && self.in_batch {
            warn!("Discarding an uncommitted batch");
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!("Rollback failed: {}", err);
            }
        }
        if let Some(ref path) = self.path {
            info!("Connection closed from database: {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests as shared;
    use tempfile::tempdir;

    #[test]
    fn seeding_is_idempotent() {
        shared::seeding_is_idempotent(&mut SqliteStore::in_memory().unwrap());
    }

    #[test]
    fn counters_only_grow() {
        shared::counters_only_grow(&mut SqliteStore::in_memory().unwrap());
    }

    #[test]
    fn unknown_words_are_ignored() {
        shared::unknown_words_are_ignored(&mut SqliteStore::in_memory().unwrap());
    }

    #[test]
    fn collisions_are_reported_not_stored() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.conn.execute("INSERT INTO words (id, word) VALUES (?1, 'impostor')",
                           params![word_id("cat")]).unwrap();
        assert_eq!(store.seed_word("cat").unwrap(),
                   Seeded::Collision { id: word_id("cat"), existing: "impostor".to_string() });
        store.commit().unwrap();
        assert_eq!(store.counts().unwrap().words, 1);
    }

    #[test]
    fn foreign_keys_reject_dangling_pairs() {
        let store = SqliteStore::in_memory().unwrap();
        let raw = store.conn.execute(
            "INSERT INTO relations (baseId, targetId, instances) VALUES (1, 2, 1)", []);
        assert!(raw.is_err());
    }

    #[test]
    fn committed_batches_survive_reopening() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flexicon.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.seed_word("cat").unwrap();
            store.seed_word("sat").unwrap();
            store.commit().unwrap();
            store.record_relationship(word_id("cat"), word_id("sat")).unwrap();
            store.commit().unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.counts().unwrap(),
                   Counts { words: 2, relations: 1, occurrences: 0, weight: 1 });
    }

    #[test]
    fn uncommitted_batches_are_lost_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flexicon.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.seed_word("cat").unwrap();
            store.commit().unwrap();
            store.record_occurrence(word_id("cat")).unwrap();
            store.seed_word("sat").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let cat = store.word(word_id("cat")).unwrap().unwrap();
        assert_eq!(cat.occurrences, 0);
        assert_eq!(store.word(word_id("sat")).unwrap(), None);
    }

    #[test]
    fn batches_recover_after_sqlite_rolls_them_back() {
        let dir = tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("flexicon.db")).unwrap();
        store.seed_word("cat").unwrap();
        store.commit().unwrap();

        let pages: i64 = store.conn
            .query_row("PRAGMA page_count", [], |row| row.get(0)).unwrap();
        let limit = |store: &SqliteStore, pages: i64| {
            let sql = format!("PRAGMA max_page_count = {}", pages);
            store.conn.query_row(&sql, [], |row| row.get::<_, i64>(0)).unwrap();
        };
        limit(&store, pages + 2);
        let mut failures = 0;
        for i in 0..5000 {
            let word = format!("{}{}", "x".repeat(200), i);
            match store.seed_word(&word) {
                Ok(_) => assert!(!store.conn.is_autocommit(), "write {} ran outside a batch", i),
                Err(_) => failures += 1,
            }
        }
        assert!(failures > 0);
        store.commit().unwrap();

        limit(&store, 1_000_000);
        store.seed_word("sat").unwrap();
        assert!(!store.conn.is_autocommit());
        store.commit().unwrap();
        assert!(store.conn.is_autocommit());
        assert_eq!(store.word(word_id("sat")).unwrap().unwrap().text, "sat");
        assert_eq!(store.word(word_id("cat")).unwrap().unwrap().text, "cat");
    }

    #[test]
    fn file_stores_use_the_write_ahead_log() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("flexicon.db")).unwrap();
        let mode: String = store.conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn memory_path_is_not_a_file() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert_eq!(store.path(), None);
    }
}
