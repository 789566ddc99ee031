//src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type MergeResult<T> = Result<T, MergeError>;

/// Every failure is fatal for the run; there is no recoverable variant.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("{} is not a directory, or the path given was incorrect", .0.display())]
    NotADirectory(PathBuf),

    #[error("at least 2 files are needed in {}, found {found}", .dir.display())]
    TooFewInputs { dir: PathBuf, found: usize },

    #[error("the suffix \"{0}\" did not match any file in the input folder")]
    SuffixMatchedNothing(String),

    #[error("output folder {} already exists, choose a new name or remove it", .0.display())]
    OutputExists(PathBuf),

    #[error("no taxonomy reference file found at {}", .0.display())]
    MissingReference(PathBuf),

    #[error("{}:{line}: expected 6 tab-separated columns, found {found}", .path.display())]
    ColumnCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("{}:{line}: unable to parse \"{value}\" as a number", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{}: a report needs at least 2 rows (unclassified and root), found {found}", .path.display())]
    TooFewRows { path: PathBuf, found: usize },

    #[error("{}: unclassified and root rows cover zero reads, cannot normalize", .0.display())]
    ZeroTotal(PathBuf),

    #[error("I/O problem with {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MergeError::Io {
            path: path.into(),
            source,
        }
    }
}
