//! Word association tables from a text corpus
//!
//! Every word of a fixed universe gets an id derived from its text. Documents are normalized
//! into tokens, each token bumps its word's count, and every pair of words within a small
//! forward window bumps the weight of that directed relationship. All writes are increments,
//! so runs can be repeated or resumed and the tables only grow.


#[macro_use] extern crate clap;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
pub mod errors;
pub mod farm;
pub mod ident;
pub mod tokenize;
pub mod window;
pub mod store;
pub mod corpus;
pub mod ingest;
pub mod config;
