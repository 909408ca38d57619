//! External metadata synchronization.
//!
//! A movie is synchronized by fetching a remote field map for its external
//! identifier and merging the resolvable fields into the local record. The
//! fetch is all-or-nothing: until a usable record arrives, the movie is not
//! touched. Once a record is in hand, individual unparsable or absent
//! fields are skipped without failing the merge.

/// Metadata record shape, source trait, and the HTTP implementation.
pub mod fetch;
/// Field merge and performer linking.
pub mod merge;

use thiserror::Error;

use crate::core::store::StoreError;

/// Errors surfaced by a synchronization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The metadata source was unreachable or returned garbage transport.
    #[error("could not reach the metadata source: {0}")]
    BadConnection(String),
    /// The external identifier is malformed or unknown to the source.
    #[error("invalid external identifier: {0}")]
    InvalidIdentifier(String),
    /// The target movie does not exist in the catalog.
    #[error(transparent)]
    Store(#[from] StoreError),
}
