use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("Cannot select {requested} items from a pool of {available}")]
    InvalidArgument { requested: usize, available: usize },

    #[error("Corrupt state in {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("Fatal state: {0}")]
    FatalState(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DutyError {
    pub fn corrupt(path: &Path, reason: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::FatalState(message.into())
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type DutyResult<T> = Result<T, DutyError>;

/// A recoverable mismatch between stored state and the current configuration.
///
/// These never abort a command; they are logged and handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The second triager of the last cycle is no longer on the roster, so the
    /// rotation restarts at the first roster entry.
    TriagerLeftRoster { name: String },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TriagerLeftRoster { name } => write!(
                f,
                "{} served last but is not on the roster; restarting rotation",
                name
            ),
        }
    }
}
