//! Run configuration
//!
//! Everything comes from the command line, except the database path which may also come from
//! `FLEXICON_DATABASE`. A configuration that can't run is rejected before anything is opened.
use std::path::PathBuf;

use clap::{App, ArgMatches};

use crate::errors::*;
use crate::store::DEFAULT_BATCH_SIZE;
use crate::tokenize::{builtin_stopwords, load_stopwords, Normalizer};
use crate::window::DEFAULT_RADIUS;

/// Environment variable naming the database file
pub const DATABASE_ENV: &str = "FLEXICON_DATABASE";

/// Database file used when neither the flag nor the environment names one
pub const DEFAULT_DATABASE: &str = "flexicon.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Word list to seed the universe from
    pub wordlist: Option<PathBuf>,
    /// Directory or file of JSON documents to ingest
    pub corpus: Option<PathBuf>,
    pub database: PathBuf,
    /// `None` means the built-in list
    pub stopwords: Option<PathBuf>,
    pub radius: usize,
    pub batch_size: usize,
    /// Count in memory, write nothing
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            wordlist: None,
            corpus: None,
            database: PathBuf::from(DEFAULT_DATABASE),
            stopwords: None,
            radius: DEFAULT_RADIUS,
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

impl Config {
    /// The command line of the `flexicon` binary
    pub fn app<'a, 'b>() -> App<'a, 'b> {
        app_from_crate!()
            .args_from_usage(
                "-w, --wordlist=[FILE] 'newline separated words to seed the word universe with'
                 -r, --corpus=[PATH] 'directory of JSON documents, or a single JSON file, to ingest'
                 -d, --database=[FILE] 'SQLite file to build (defaults to $FLEXICON_DATABASE, then flexicon.db)'
                 -s, --stopwords=[FILE] 'newline separated stopwords (defaults to a built-in English list)'
                 --radius=[N] 'how many following words count as related (default 5)'
                 --batch=[N] 'words or documents per transaction (default 2500)'
                 --dry-run 'count in memory without writing a database'")
    }

    /// Build a configuration from parsed arguments.
    ///
    /// `env_database` is the value of `FLEXICON_DATABASE`, if set.
    pub fn from_matches(args: &ArgMatches, env_database: Option<String>) -> Result<Config> {
        let defaults = Config::default();
        let config = Config {
            wordlist: args.value_of("wordlist").map(PathBuf::from),
            corpus: args.value_of("corpus").map(PathBuf::from),
            database: args.value_of("database").map(PathBuf::from)
                .or_else(|| env_database.filter(|db| !db.is_empty()).map(PathBuf::from))
                .unwrap_or(defaults.database),
            stopwords: args.value_of("stopwords").map(PathBuf::from),
            radius: positive(args.value_of("radius"), "radius", defaults.radius)?,
            batch_size: positive(args.value_of("batch"), "batch", defaults.batch_size)?,
            dry_run: args.is_present("dry-run"),
        };
        if config.wordlist.is_none() && config.corpus.is_none() {
            return Err(Error::Usage(
                "No sources given, so no processing can be done. \
                Pass --wordlist, --corpus, or both.".to_string()));
        }
        Ok(config)
    }

    /// Fail early if an input doesn't exist
    pub fn check_resources(&self) -> Result<()> {
        let inputs = [
            ("word list", &self.wordlist),
            ("corpus", &self.corpus),
            ("stopword list", &self.stopwords),
        ];
        for &(what, path) in inputs.iter() {
            if let Some(ref path) = *path {
                if !path.exists() {
                    return Err(Error::MissingFile(what, path.clone(), None));
                }
            }
        }
        Ok(())
    }

    /// The normalizer for this run's stopwords
    pub fn normalizer(&self) -> Result<Normalizer> {
        let stopwords = match self.stopwords {
            Some(ref path) => load_stopwords(path)?,
            None => builtin_stopwords(),
        };
        Ok(Normalizer::new(stopwords))
    }
}

fn positive(value: Option<&str>, name: &str, default: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(text) => match text.parse::<usize>() {
            Ok(0) => Err(Error::Config(format!("--{} must be at least 1", name))),
            Ok(n) => Ok(n),
            Err(err) => Err(Error::Config(format!("--{} {:?}: {}", name, text, err))),
        },
    }
}
