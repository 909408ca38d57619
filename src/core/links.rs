use crate::{
    core::store::{CatalogStore, StoreError},
    types::{MovieId, PerformerId},
};

/// Result of an unlink: whether anything was removed and whether the
/// performer is now a cascade-delete candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkOutcome {
    /// True when the pair was linked before the call.
    pub was_linked: bool,
    /// True when the performer is left with no linked movies. Deleting it
    /// stays a caller decision; see [`CatalogStore::remove_performer`].
    pub orphaned: bool,
}

impl CatalogStore {
    /// Links a movie and a performer, inserting each into the other's list.
    ///
    /// Idempotent: linking an already-linked pair is a no-op. Returns true
    /// when a new link was made.
    pub fn link(&mut self, movie: MovieId, performer: PerformerId) -> Result<bool, StoreError> {
        if self.get_movie(movie).is_none() {
            return Err(StoreError::MissingMovie(movie));
        }
        if self.get_performer(performer).is_none() {
            return Err(StoreError::MissingPerformer(performer));
        }
        if self
            .get_movie(movie)
            .is_some_and(|m| m.performers.contains(&performer))
        {
            return Ok(false);
        }

        self.movie_mut(movie)?.performers.push(performer);
        self.performer_mut(performer)?.movies.push(movie);
        self.set_dirty();
        Ok(true)
    }

    /// Removes the mutual reference between a movie and a performer.
    ///
    /// Unlinking a pair that was never linked is a no-op, not an error.
    /// The performer is never deleted here, even when orphaned; the outcome
    /// reports the orphan state so the caller can decide.
    pub fn unlink(
        &mut self,
        movie: MovieId,
        performer: PerformerId,
    ) -> Result<UnlinkOutcome, StoreError> {
        if self.get_movie(movie).is_none() {
            return Err(StoreError::MissingMovie(movie));
        }
        if self.get_performer(performer).is_none() {
            return Err(StoreError::MissingPerformer(performer));
        }

        let was_linked = {
            let m = self.movie_mut(movie)?;
            match m.performers.iter().position(|p| *p == performer) {
                Some(pos) => {
                    m.performers.remove(pos);
                    true
                }
                None => false,
            }
        };

        let orphaned = {
            let p = self.performer_mut(performer)?;
            if was_linked
                && let Some(pos) = p.movies.iter().position(|m| *m == movie)
            {
                p.movies.remove(pos);
            }
            p.movies.is_empty()
        };

        if was_linked {
            self.set_dirty();
        }

        Ok(UnlinkOutcome { was_linked, orphaned })
    }
}
