//! Runtime event stream payloads.

use crate::{
    persist::LoadReport,
    types::{MovieId, PerformerId},
};

/// Events emitted from the single-writer runtime loop.
///
/// A GUI embedding subscribes to these to refresh its views; the loop never
/// waits for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A new movie was added.
    MovieAdded {
        /// Added movie id.
        id: MovieId,
    },
    /// A new performer was added.
    PerformerAdded {
        /// Added performer id.
        id: PerformerId,
    },
    /// An existing movie was updated.
    MovieUpdated {
        /// Updated movie id.
        id: MovieId,
    },
    /// An existing performer was updated.
    PerformerUpdated {
        /// Updated performer id.
        id: PerformerId,
    },
    /// A movie was removed, possibly cascading to orphaned performers.
    MovieRemoved {
        /// Removed movie id.
        id: MovieId,
        /// Performers removed by the cascade.
        performers_removed: Vec<PerformerId>,
    },
    /// A performer was removed.
    PerformerRemoved {
        /// Removed performer id.
        id: PerformerId,
    },
    /// A movie/performer pair became linked.
    Linked {
        /// Movie side of the link.
        movie: MovieId,
        /// Performer side of the link.
        performer: PerformerId,
    },
    /// A movie/performer pair became unlinked.
    Unlinked {
        /// Movie side of the former link.
        movie: MovieId,
        /// Performer side of the former link.
        performer: PerformerId,
        /// True when the performer is now a cascade-delete candidate.
        orphaned: bool,
    },
    /// The catalog was saved and the dirty flag cleared.
    Saved,
    /// The catalog was replaced by a load.
    Loaded {
        /// Skip counts and recovery notes from the load.
        report: LoadReport,
    },
    /// A movie finished merging remote metadata.
    Synchronized {
        /// Synchronized movie id.
        movie: MovieId,
    },
}
