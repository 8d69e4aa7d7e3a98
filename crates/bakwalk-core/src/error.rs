//! Error type shared by every core operation

use crate::diff::DiffError;
use crate::display::DisplayError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalkError {
    /// Numbered backups are not enabled, so there is nothing sensible to walk
    #[error("{0}")]
    Configuration(String),
    #[error("no backups found for {}", original.display())]
    NoBackups { original: PathBuf },
    #[error("{0}")]
    OutOfRange(String),
    #[error("no version number in {name:?} after offset {start}")]
    NoVersion { name: String, start: usize },
    #[error("diff failed: {0}")]
    Diff(#[from] DiffError),
    #[error("display error: {0}")]
    Display(#[from] DisplayError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line:?} not found in {label}")]
    LineNotFound { line: String, label: String },
    #[error("nothing to search for")]
    EmptyNeedle,
}

impl WalkError {
    /// Errors that prevent a session from existing at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, WalkError::Configuration(_) | WalkError::NoBackups { .. })
    }
}
