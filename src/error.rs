//! Error types for timer, store and export operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::timer::Phase;

/// Raised when a timer operation is attempted in a phase that does not allow it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("cannot {op} while {phase}")]
    InvalidTransition { op: &'static str, phase: Phase },
}

/// Errors from reading or writing a session file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The file exists but does not hold a well-formed session list.
    #[error("corrupt session data in {path}: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    /// Reading, writing or deleting the file failed.
    #[error("failed to {action} {path}: {source}")]
    PersistenceFailure {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::CorruptData { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no recorded sessions to report")]
    NothingToReport,

    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write csv report: {0}")]
    Csv(#[from] csv::Error),
}

/// Crate-level error returned by the tracker.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Identity changes are refused while a session is running or paused.
    #[error("a session is still active for {employee}")]
    ActiveSession { employee: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
