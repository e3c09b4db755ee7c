//! Error taxonomy for the extraction pipeline.
//!
//! Structural and resource problems are recovered locally and logged;
//! configuration and worker problems abort the run before any output is
//! committed.

use std::path::PathBuf;

/// Errors that can occur while flattening a document.
#[derive(Debug, thiserror::Error)]
pub enum FlattexError {
    /// Unbalanced groups or an unmatched environment. Recovered with
    /// best-effort pass-through; carried as the structured diagnostic on
    /// the recovery log.
    #[error("structural problem: {0}")]
    Structural(String),

    /// A single line already meets or exceeds the chunk budget. Fatal:
    /// the downstream consumer cannot process that unit.
    #[error("line of {length} chars meets or exceeds the chunk budget of {budget}")]
    Configuration { length: usize, budget: usize },

    /// The root input file could not be read. Missing includes degrade to
    /// an inline warning marker instead.
    #[error("missing file: {path}")]
    Resource { path: PathBuf },

    /// A paragraph transform failed. Aborts the batch; the failing
    /// paragraph is surfaced for diagnosis.
    #[error("worker failed on paragraph {index}: {message}\n--- paragraph content ---\n{content}")]
    Worker {
        index: usize,
        message: String,
        content: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlattexError>;
