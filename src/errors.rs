//
// Errors
//
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::result;

/// Type alias for flexicon errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for many kinds of errors occuring while building the tables
#[derive(Debug)]
pub enum Error {
    /// Neither a word list nor a corpus was requested
    Usage(String),
    /// A setting is present but unusable
    Config(String),
    IOError(io::Error),
    SqliteError(rusqlite::Error),
    JsonError(serde_json::Error),
    WalkError(walkdir::Error),
    MissingFile(&'static str, PathBuf, Option<io::Error>),
    Other(String),
}

impl Error {
    /// Errors that end the run before anything was written.
    pub fn is_fatal_setup(&self) -> bool {
        match *self {
            Error::Usage(_) | Error::Config(_) | Error::MissingFile(..) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Usage(ref info) => write!(f, "Usage error: {}", info),
            Error::Config(ref info) => write!(f, "Configuration error: {}", info),
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::SqliteError(ref err) => write!(f, "SQLite error: {}", err),
            Error::JsonError(ref err) => write!(f, "Malformed JSON: {}", err),
            Error::WalkError(ref err) => write!(f, "Error listing the corpus: {}", err),
            Error::MissingFile(ref info, ref path, ref opt_err) => {
                write!(f,
                    "The {} must already exist at {} but there was a problem opening it. \
                    Wrong directory? The OS error was: ",
                    info, path.display())?;
                if let Some(ref err) = *opt_err { err.fmt(f) }
                else { write!(f, "Not found") }
            },
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Usage(_) => None,
            Error::Config(_) => None,
            Error::IOError(ref err) => Some(err),
            Error::SqliteError(ref err) => Some(err),
            Error::JsonError(ref err) => Some(err),
            Error::WalkError(ref err) => Some(err),
            Error::MissingFile(_, _, Some(ref err)) => Some(err),
            Error::MissingFile(_, _, None) => None,
            Error::Other(_) => None,
        }
    }
}
//
// Convert everything else into Error
//
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::SqliteError(err)
    }
}
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkError(err)
    }
}
