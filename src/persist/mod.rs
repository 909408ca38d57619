//! Persistence abstraction and directory-backed engine.

pub mod dir;

use thiserror::Error;

use crate::core::store::CatalogSnapshot;

/// Errors surfaced by save/load operations.
///
/// Any error leaves the prior on-disk state intact; partial writes never
/// replace the live records directory.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure during save or load.
    #[error("catalog i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Record encode/decode failure.
    #[error("catalog serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other persistence failure, e.g. a format version mismatch.
    #[error("{0}")]
    Message(String),
}

/// Convenience alias for persistence results.
pub type PersistResult<T> = Result<T, PersistError>;

/// Non-fatal observations from a load.
///
/// Dangling performer references and unreadable record files are skipped
/// and logged rather than aborting the load; the counts land here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Movie→performer references that resolved to no known performer.
    pub dangling_links: usize,
    /// Record files that could not be read or parsed.
    pub skipped_files: usize,
    /// True when the live directory was missing and the backup left by an
    /// interrupted save was loaded instead.
    pub recovered_from_backup: bool,
}

/// Whole-graph persistence sink.
///
/// [`dir::CatalogDir`] is the production implementation; tests inject
/// failing sinks to exercise the dirty-flag contract.
pub trait CatalogSink: Send {
    /// Durably writes the full graph, atomically from the caller's view.
    fn save(&mut self, snapshot: &CatalogSnapshot) -> PersistResult<()>;

    /// Reads the full graph back, reporting skipped records and links.
    fn load(&mut self) -> PersistResult<(CatalogSnapshot, LoadReport)>;
}
