//! Corpus of JSON documents
//!
//! A corpus is either a directory of `.json` files or a single `.json` file. Each file holds one
//! `{"title": ..., "text": ...}` object or an array of them, as plain-text Wikipedia dumps do.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::errors::*;
use crate::tokenize::Normalizer;

/// One document of the corpus
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: String,
    pub text: String,
}

/// The files making up a corpus
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Corpus {
    /// List the corpus at `path`, which must exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Corpus> {
        let root = path.as_ref().to_path_buf();
        if !root.exists() {
            return Err(Error::MissingFile("corpus", root, None));
        }
        let mut files = vec![];
        if root.is_dir() {
            for entry in WalkDir::new(&root).min_depth(1).max_depth(1).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_json(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(root.clone());
        }
        info!("Found {} corpus files at {}", files.len(), root.display());
        Ok(Corpus { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

/// Read every record of one corpus file.
///
/// The outer error means the whole file is unusable. Inner errors are single records that
/// don't look like documents; the rest of the file is still returned.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Result<Document>>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let value: Value = serde_json::from_reader(reader)?;
    parse_records(value)
}

/// How many tokens survive normalization across the whole corpus. Unreadable files and
/// malformed records are logged and left out.
pub fn count_tokens(corpus: &Corpus, normalizer: &Normalizer) -> usize {
    let mut term_count = 0;
    for file in corpus.files() {
        match read_file(file) {
            Ok(records) => {
                for (i, record) in records.into_iter().enumerate() {
                    match record {
                        Ok(doc) => term_count += normalizer.tokens(&doc.text).len(),
                        Err(err) => warn!("Skipping malformed record {} of {}: {}",
                            i, file.display(), err),
                    }
                }
            }
            Err(err) => warn!("Skipping {}: {}", file.display(), err),
        }
    }
    term_count
}

#[cfg(test)]
fn parse_str(content: &str) -> Result<Vec<Result<Document>>> {
    parse_records(serde_json::from_str(content)?)
}

fn parse_records(value: Value) -> Result<Vec<Result<Document>>> {
    match value {
        Value::Array(records) => Ok(records.into_iter().map(to_document).collect()),
        record @ Value::Object(_) => Ok(vec![to_document(record)]),
        other => Err(Error::Other(format!(
            "Expected a document object or an array of them, found {}", kind(&other)))),
    }
}

fn to_document(record: Value) -> Result<Document> {
    Ok(serde_json::from_value(record)?)
}

fn kind(value: &Value) -> &'static str {
    match *value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
