//! Crate error type.
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors of which majority are related to I/O issues or incorrect file format errors
pub enum Error {
    #[error("Could not read or write sequence data")]
    /// Reading reads or writing contigs/diagnostics failed
    Io(#[from] std::io::Error),
    #[error("Could not open sequence file")]
    /// Opening a possibly compressed sequence file failed
    SequenceFile(#[from] niffler::Error),
    #[error("Unknown tie-break policy `{0}`, expected `first` or `lexicographic`")]
    /// Incorrect tie-break policy supplied
    UnknownTieBreak(String),
    #[error("Graph is inconsistent: {0}")]
    /// A node or edge reference does not agree with its counterpart
    Inconsistent(String),
}
