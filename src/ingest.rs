//! Seeding the word universe and ingesting documents
//!
//! A run moves through `Seeding`, `Processing` and `Done`, in that order. Work is counted in
//! units (one seeded word, one document) and the store is committed every `batch_size` units,
//! so a crash only loses the batch in flight.
//!
//! Nothing below the batch commit aborts a run: a bad word, an unreadable file, a malformed
//! record or a failed increment is logged, counted, and skipped.
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::Config;
use crate::corpus::{self, Corpus, Document};
use crate::errors::*;
use crate::store::{Counts, MemoryStore, Seeded, SqliteStore, Store, DEFAULT_BATCH_SIZE};
use crate::tokenize::Normalizer;
use crate::window::{Window, DEFAULT_RADIUS};

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Processing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Phase::Seeding => write!(f, "seeding"),
            Phase::Processing => write!(f, "processing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// What seeding did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Non-blank lines read
    pub words: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub collisions: usize,
    pub failed: usize,
}

/// What ingestion did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub documents: usize,
    /// Unreadable files and malformed records
    pub skipped: usize,
    pub tokens: usize,
    /// Tokens outside the word universe
    pub unknown_tokens: usize,
    pub relations: usize,
    /// Pairs with at least one word outside the universe
    pub outside_universe: usize,
    /// Store operations that failed and were skipped
    pub failed: usize,
}

/// Drives a store through seeding and ingestion
pub struct Ingestor<S: Store> {
    store: S,
    normalizer: Normalizer,
    radius: usize,
    batch_size: usize,
    phase: Phase,
    pending: usize,
}

impl<S: Store> Ingestor<S> {
    pub fn new(store: S, normalizer: Normalizer) -> Self {
        Ingestor {
            store,
            normalizer,
            radius: DEFAULT_RADIUS,
            batch_size: DEFAULT_BATCH_SIZE,
            phase: Phase::Seeding,
            pending: 0,
        }
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// A batch size of 0 is treated as 1
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Seed the universe from a word list, one word per line
    pub fn seed<P: AsRef<Path>>(&mut self, path: P) -> Result<SeedReport> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::MissingFile("word list", path.to_path_buf(), Some(e)))?;
        info!("Parsing words at source {}", path.display());
        let mut words = vec![];
        let mut unreadable = 0;
        for (line_no, line) in BufReader::new(file).split(b'\n').enumerate() {
            match String::from_utf8(line?) {
                Ok(word) => words.push(word),
                Err(_) => {
                    warn!("Line {} of {} is not UTF-8, skipping it", line_no + 1, path.display());
                    unreadable += 1;
                }
            }
        }
        let mut report = self.seed_words(&words[..])?;
        report.failed += unreadable;
        Ok(report)
    }

    /// Seed the universe from words already in memory
    pub fn seed_words<W: AsRef<str>>(&mut self, words: &[W]) -> Result<SeedReport> {
        self.enter(Phase::Seeding)?;
        let total = words.len();
        let mut report = SeedReport::default();
        for (i, word) in words.iter().enumerate() {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            report.words += 1;
            match self.store.seed_word(word) {
                Ok(Seeded::Inserted(_)) => report.inserted += 1,
                Ok(Seeded::Duplicate(_)) => report.duplicates += 1,
                Ok(Seeded::Collision { id, existing }) => {
                    warn!("'{}' collides with '{}' on id {}; keeping '{}'",
                        word, existing, id, existing);
                    report.collisions += 1;
                }
                Err(err) => {
                    warn!("Could not seed '{}': {}", word, err);
                    report.failed += 1;
                }
            }
            if self.unit_done()? {
                info!("Loaded {} of {} words ({:.1}%)", i + 1, total, percent(i + 1, total));
            }
        }
        self.flush()?;
        info!("Seeded {} new words ({} already known, {} collisions, {} failed)",
            report.inserted, report.duplicates, report.collisions, report.failed);
        Ok(report)
    }

    /// Ingest every document of a corpus directory or file
    pub fn ingest<P: AsRef<Path>>(&mut self, path: P) -> Result<IngestReport> {
        let corpus = Corpus::open(path)?;
        self.enter(Phase::Processing)?;
        if corpus.is_empty() {
            warn!("No .json documents found at {}", corpus.root().display());
        }
        let total = corpus.len();
        let mut report = IngestReport::default();
        for (i, file) in corpus.files().iter().enumerate() {
            report.files += 1;
            match corpus::read_file(file) {
                Ok(records) => self.ingest_records(records, &mut report)?,
                Err(err) => {
                    warn!("Skipping {}: {}", file.display(), err);
                    report.skipped += 1;
                }
            }
            debug!("Parsed {} ({} of {}, {:.1}%)", file.display(), i + 1, total,
                percent(i + 1, total));
        }
        self.flush()?;
        log_ingest(&report);
        Ok(report)
    }

    /// Ingest documents already in memory. Records that failed to decode are skipped.
    pub fn ingest_documents<I>(&mut self, records: I) -> Result<IngestReport>
        where I: IntoIterator<Item = Result<Document>> {
        self.enter(Phase::Processing)?;
        let mut report = IngestReport::default();
        self.ingest_records(records, &mut report)?;
        self.flush()?;
        log_ingest(&report);
        Ok(report)
    }

    /// Final commit. The ingestor accepts no more work afterwards.
    pub fn finish(&mut self) -> Result<Counts> {
        self.flush()?;
        self.phase = Phase::Done;
        let counts = self.store.counts()?;
        info!("Done: {} words, {} relations, {} occurrences, total weight {}",
            counts.words, counts.relations, counts.occurrences, counts.weight);
        Ok(counts)
    }

    fn ingest_records<I>(&mut self, records: I, report: &mut IngestReport) -> Result<()>
        where I: IntoIterator<Item = Result<Document>> {
        for (i, record) in records.into_iter().enumerate() {
            match record {
                Ok(document) => {
                    self.ingest_document(&document, report);
                    report.documents += 1;
                    if self.unit_done()? {
                        info!("Committed {} documents, last was '{}'",
                            report.documents, truncate(&document.title, 60));
                    }
                }
                Err(err) => {
                    warn!("Skipping malformed record {}: {}", i, err);
                    report.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Count every token, then every pair in its window. Failures stay inside this document.
    fn ingest_document(&mut self, document: &Document, report: &mut IngestReport) {
        debug!("Parsing article: {}", truncate(&document.title, 60));
        let ids = self.normalizer.ids(&document.text);
        report.tokens += ids.len();
        for &id in &ids {
            match self.store.record_occurrence(id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    trace!("Token {} of '{}' is not a known word", id, document.title);
                    report.unknown_tokens += 1;
                }
                Err(err) => {
                    warn!("Could not count word {} in '{}': {}", id, document.title, err);
                    report.failed += 1;
                }
            }
        }
        for (base, target) in Window::new(&ids[..], self.radius).pairs() {
            match self.store.record_relationship(base, target) {
                Ok(Some(_)) => report.relations += 1,
                Ok(None) => report.outside_universe += 1,
                Err(err) => {
                    warn!("Could not relate {} -> {} in '{}': {}",
                        base, target, document.title, err);
                    report.failed += 1;
                }
            }
        }
    }

    fn enter(&mut self, next: Phase) -> Result<()> {
        let allowed = match (self.phase, next) {
            (Phase::Seeding, Phase::Seeding) => true,
            (Phase::Seeding, Phase::Processing) => true,
            (Phase::Processing, Phase::Processing) => true,
            _ => false,
        };
        if !allowed {
            return Err(Error::Other(format!(
                "Can't start {} once the run is {}", next, self.phase)));
        }
        if self.phase != next {
            info!("Finished {}, now {}", self.phase, next);
            self.phase = next;
        }
        Ok(())
    }

    /// Count one unit of work, committing when the batch is full. True if it committed.
    fn unit_done(&mut self) -> Result<bool> {
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn flush(&mut self) -> Result<()> {
        self.store.commit()?;
        self.pending = 0;
        Ok(())
    }
}

/// Run everything a configuration asks for against an open store
pub fn run_with<S: Store>(config: &Config, store: S) -> Result<Counts> {
    let mut ingestor = Ingestor::new(store, config.normalizer()?)
        .with_radius(config.radius)
        .with_batch_size(config.batch_size);
    if let Some(ref wordlist) = config.wordlist {
        ingestor.seed(wordlist)?;
    }
    if let Some(ref corpus) = config.corpus {
        ingestor.ingest(corpus)?;
    }
    ingestor.finish()
}

/// Validate a configuration, open its store, and run it. The store is closed on every path.
pub fn run(config: &Config) -> Result<Counts> {
    config.check_resources()?;
    if config.dry_run {
        info!("Dry run: counting in memory only");
        run_with(config, MemoryStore::new())
    } else {
        run_with(config, SqliteStore::open(&config.database)?)
    }
}

fn log_ingest(report: &IngestReport) {
    info!("Ingested {} documents from {} files: {} tokens, {} relation updates",
        report.documents, report.files, report.tokens, report.relations);
    if report.skipped > 0 || report.failed > 0 {
        warn!("{} files or records skipped, {} store operations failed",
            report.skipped, report.failed);
    }
    if report.unknown_tokens > 0 {
        warn!("{} tokens and {} pairs were outside the word universe",
            report.unknown_tokens, report.outside_universe);
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 { 100.0 } else { 100.0 * done as f64 / total as f64 }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
