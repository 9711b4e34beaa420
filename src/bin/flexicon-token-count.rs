//! Count the tokens of a corpus
//!
//! Runs every document of a corpus (a directory of JSON documents or a single JSON file)
//! through the same normalization as ingestion and prints how many tokens survive. Handy for
//! sizing a run before committing to it.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate flexicon;

use std::process;

use flexicon::corpus::{self, Corpus};
use flexicon::errors::*;
use flexicon::tokenize::{builtin_stopwords, load_stopwords, Normalizer};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    if let Err(err) = inner_main() {
        error!("{}", err);
        eprintln!("{}", err);
        process::exit(1);
    }
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<corpus> 'directory of JSON documents, or a single JSON file'")
        .arg_from_usage("-s, --stopwords=[FILE] 'newline separated stopwords'")
        .get_matches();

    let normalizer = Normalizer::new(match args.value_of("stopwords") {
        Some(path) => load_stopwords(path)?,
        None => builtin_stopwords(),
    });
    let corpus = Corpus::open(args.value_of("corpus").unwrap_or("."))?;

    let term_count = corpus::count_tokens(&corpus, &normalizer);
    println!("{}", term_count);
    Ok(())
}
