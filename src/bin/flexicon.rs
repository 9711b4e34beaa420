//! Build the flexicon tables
//!
//! Seeds the word universe from a newline separated word list and/or ingests a corpus of JSON
//! documents into a SQLite database:
//!
//! ```text
//! flexicon -w words_alpha.txt -r wiki/ -d flexicon.db
//! ```
//!
//! Either step can run alone. Progress goes to the log; set `RUST_LOG=debug` to see every
//! document.

// argument parsing happens in the library
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate flexicon;

use std::env;
use std::process;

use flexicon::config::{Config, DATABASE_ENV};
use flexicon::errors::*;
use flexicon::ingest;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    if let Err(err) = inner_main() {
        error!("{}", err);
        eprintln!("{}", err);
        process::exit(if err.is_fatal_setup() { 2 } else { 1 });
    }
}
pub fn inner_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Config::app().get_matches();
    let config = Config::from_matches(&args, env::var(DATABASE_ENV).ok())?;

    let counts = ingest::run(&config)?;
    println!("{} words, {} relations, {} occurrences, total weight {}",
        counts.words, counts.relations, counts.occurrences, counts.weight);
    Ok(())
}
