use hashbrown::HashMap;
use thiserror::Error;

use crate::{
    movie::{MovieDraft, MoviePatch, MovieRecord},
    performer::{PerformerDraft, PerformerPatch, PerformerRecord},
    types::{MovieId, PerformerId, RATING_MAX, Rating, clamp_rating},
};

/// Errors surfaced by catalog store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No movie with the given id exists.
    #[error("no movie with id {0}")]
    MissingMovie(MovieId),
    /// No performer with the given id exists.
    #[error("no performer with id {0}")]
    MissingPerformer(PerformerId),
    /// A strict update carried a rating outside the 0..=100 range.
    #[error("rating {0} is outside the 0..={RATING_MAX} range")]
    RatingOutOfRange(Rating),
}

/// Full-graph snapshot exchanged with the persistence engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// Next movie id to assign.
    pub next_movie_id: MovieId,
    /// Next performer id to assign.
    pub next_performer_id: PerformerId,
    /// Movie ids in display order.
    pub movie_order: Vec<MovieId>,
    /// Performer ids in display order.
    pub performer_order: Vec<PerformerId>,
    /// Movie records in display order.
    pub movies: Vec<MovieRecord>,
    /// Performer records in display order.
    pub performers: Vec<PerformerRecord>,
}

impl CatalogSnapshot {
    /// Snapshot of an empty catalog.
    pub fn empty() -> Self {
        Self {
            next_movie_id: 1,
            next_performer_id: 1,
            movie_order: Vec::new(),
            performer_order: Vec::new(),
            movies: Vec::new(),
            performers: Vec::new(),
        }
    }
}

/// Process-wide collection of all movies and performers.
///
/// The store owns every entity; linked entities reference each other by id
/// so that serialization stores identifier lists rather than object graphs.
/// Any successful mutation sets the dirty flag, which only clears via
/// [`CatalogStore::mark_saved`] or a wholesale load.
#[derive(Debug, Default)]
pub struct CatalogStore {
    movies: HashMap<MovieId, MovieRecord>,
    performers: HashMap<PerformerId, PerformerRecord>,
    movie_order: Vec<MovieId>,
    performer_order: Vec<PerformerId>,
    by_name: HashMap<String, Vec<PerformerId>>,
    next_movie_id: MovieId,
    next_performer_id: PerformerId,
    dirty: bool,
}

impl CatalogStore {
    /// Creates an empty store with a clean dirty flag.
    pub fn new() -> Self {
        Self {
            next_movie_id: 1,
            next_performer_id: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a store from a snapshot, leaving the dirty flag clear.
    ///
    /// The snapshot is trusted to carry symmetric link lists; the
    /// persistence engine reconstructs them before handing one over.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut store = Self {
            next_movie_id: snapshot.next_movie_id,
            next_performer_id: snapshot.next_performer_id,
            movie_order: snapshot.movie_order,
            performer_order: snapshot.performer_order,
            ..Self::default()
        };

        for rec in snapshot.movies {
            store.next_movie_id = store.next_movie_id.max(rec.id.saturating_add(1));
            store.movies.insert(rec.id, rec);
        }
        for rec in snapshot.performers {
            store.next_performer_id = store.next_performer_id.max(rec.id.saturating_add(1));
            store.by_name.entry(rec.full_name()).or_default().push(rec.id);
            store.performers.insert(rec.id, rec);
        }

        store
    }

    /// Exports the full graph in display order.
    pub fn export_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            next_movie_id: self.next_movie_id,
            next_performer_id: self.next_performer_id,
            movie_order: self.movie_order.clone(),
            performer_order: self.performer_order.clone(),
            movies: self
                .movie_order
                .iter()
                .filter_map(|id| self.movies.get(id).cloned())
                .collect(),
            performers: self
                .performer_order
                .iter()
                .filter_map(|id| self.performers.get(id).cloned())
                .collect(),
        }
    }

    /// Adds a movie with a fresh id and returns the id.
    pub fn add_movie(&mut self, draft: MovieDraft) -> MovieId {
        let id = self.next_movie_id;
        self.next_movie_id += 1;

        let rec = MovieRecord {
            id,
            title: draft.title,
            description: draft.description,
            country: draft.country,
            language: draft.language,
            runtime: draft.runtime,
            watch_date: draft.watch_date,
            release_date: draft.release_date,
            rating: clamp_rating(draft.rating),
            filming_locations: draft.filming_locations,
            alternative_titles: draft.alternative_titles,
            external_id: draft.external_id,
            performers: Vec::new(),
        };

        self.movie_order.push(id);
        self.movies.insert(id, rec);
        self.dirty = true;
        id
    }

    /// Adds a performer with a fresh id and returns the id.
    ///
    /// The new performer starts with no linked movies; callers that need
    /// the no-orphan rule to hold should link it in the same logical step.
    pub fn add_performer(&mut self, draft: PerformerDraft) -> PerformerId {
        let id = self.next_performer_id;
        self.next_performer_id += 1;

        let rec = PerformerRecord {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            biography: draft.biography,
            country: draft.country,
            alternate_names: draft.alternate_names,
            date_of_birth: draft.date_of_birth,
            rating: clamp_rating(draft.rating),
            external_id: draft.external_id,
            movies: Vec::new(),
        };

        self.by_name.entry(rec.full_name()).or_default().push(id);
        self.performer_order.push(id);
        self.performers.insert(id, rec);
        self.dirty = true;
        id
    }

    /// Applies a sparse patch to a movie, clamping out-of-range ratings.
    pub fn update_movie(&mut self, id: MovieId, patch: MoviePatch) -> Result<(), StoreError> {
        let rec = self.movies.get_mut(&id).ok_or(StoreError::MissingMovie(id))?;
        if patch.is_empty() {
            return Ok(());
        }
        patch.apply_to(rec);
        self.dirty = true;
        Ok(())
    }

    /// Applies a sparse patch to a movie, rejecting out-of-range ratings
    /// without touching the record.
    pub fn update_movie_strict(&mut self, id: MovieId, patch: MoviePatch) -> Result<(), StoreError> {
        if let Some(rating) = patch.rating
            && rating > RATING_MAX
        {
            return Err(StoreError::RatingOutOfRange(rating));
        }
        self.update_movie(id, patch)
    }

    /// Applies a sparse patch to a performer, clamping out-of-range ratings.
    ///
    /// The name index follows renames.
    pub fn update_performer(
        &mut self,
        id: PerformerId,
        patch: PerformerPatch,
    ) -> Result<(), StoreError> {
        let rec = self
            .performers
            .get_mut(&id)
            .ok_or(StoreError::MissingPerformer(id))?;
        if patch.is_empty() {
            return Ok(());
        }

        let old_name = rec.full_name();
        patch.apply_to(rec);
        let new_name = rec.full_name();

        if new_name != old_name {
            Self::remove_from_vec_index(self.by_name.entry(old_name).or_default(), id);
            self.by_name.entry(new_name).or_default().push(id);
        }

        self.dirty = true;
        Ok(())
    }

    /// Applies a sparse patch to a performer, rejecting out-of-range ratings
    /// without touching the record.
    pub fn update_performer_strict(
        &mut self,
        id: PerformerId,
        patch: PerformerPatch,
    ) -> Result<(), StoreError> {
        if let Some(rating) = patch.rating
            && rating > RATING_MAX
        {
            return Err(StoreError::RatingOutOfRange(rating));
        }
        self.update_performer(id, patch)
    }

    /// Removes a movie and cascades to performers left without any movie.
    ///
    /// Returns the ids of performers removed by the cascade, in link order.
    pub fn remove_movie(&mut self, id: MovieId) -> Result<Vec<PerformerId>, StoreError> {
        let movie = self.movies.remove(&id).ok_or(StoreError::MissingMovie(id))?;
        Self::remove_from_vec_index(&mut self.movie_order, id);

        let mut orphaned = Vec::new();
        for pid in movie.performers {
            if let Some(p) = self.performers.get_mut(&pid) {
                Self::remove_from_vec_index(&mut p.movies, id);
                if p.movies.is_empty() {
                    orphaned.push(pid);
                }
            }
        }

        for pid in &orphaned {
            self.drop_performer_entry(*pid);
        }

        tracing::debug!(movie = id, cascaded = orphaned.len(), "removed movie");
        self.dirty = true;
        Ok(orphaned)
    }

    /// Removes a performer, unlinking it from every movie first.
    pub fn remove_performer(&mut self, id: PerformerId) -> Result<(), StoreError> {
        let movies = self
            .performers
            .get(&id)
            .ok_or(StoreError::MissingPerformer(id))?
            .movies
            .clone();

        for mid in movies {
            if let Some(m) = self.movies.get_mut(&mid) {
                Self::remove_from_vec_index(&mut m.performers, id);
            }
        }

        self.drop_performer_entry(id);
        self.dirty = true;
        Ok(())
    }

    /// Reports which performers would be orphaned by removing this movie,
    /// without mutating anything. Intended for confirmation prompts.
    pub fn orphans_after_removal(&self, id: MovieId) -> Result<Vec<PerformerId>, StoreError> {
        let movie = self.movies.get(&id).ok_or(StoreError::MissingMovie(id))?;
        Ok(movie
            .performers
            .iter()
            .copied()
            .filter(|pid| {
                self.performers
                    .get(pid)
                    .is_some_and(|p| p.movies.len() == 1)
            })
            .collect())
    }

    /// Overall rating: when linked performers carry a positive rating sum,
    /// the average of the performer average and the movie rating, in
    /// integer math; otherwise the movie rating alone.
    pub fn overall_rating(&self, id: MovieId) -> Result<Rating, StoreError> {
        let movie = self.movies.get(&id).ok_or(StoreError::MissingMovie(id))?;
        let sum: Rating = movie
            .performers
            .iter()
            .filter_map(|pid| self.performers.get(pid))
            .map(|p| p.rating)
            .sum();
        if sum > 0 {
            let count = movie.performers.len() as Rating;
            Ok((sum / count + movie.rating) / 2)
        } else {
            Ok(movie.rating)
        }
    }

    /// Looks up a performer by exact full name, first match in catalog order.
    pub fn find_performer_by_name(&self, name: &str) -> Option<&PerformerRecord> {
        self.by_name
            .get(name)
            .and_then(|ids| ids.first())
            .and_then(|id| self.performers.get(id))
    }

    /// Movies sorted by watch date ascending, unwatched first unless ignored,
    /// skipping movies below the rating threshold.
    pub fn watched_movies_oldest_first(
        &self,
        ignore_unwatched: bool,
        min_rating: Rating,
    ) -> Vec<&MovieRecord> {
        let mut out: Vec<&MovieRecord> = self
            .movie_order
            .iter()
            .filter_map(|id| self.movies.get(id))
            .filter(|m| m.rating >= min_rating)
            .filter(|m| !(ignore_unwatched && m.watch_date.is_none()))
            .collect();
        out.sort_by_key(|m| m.watch_date);
        out
    }

    /// Gets a movie by id.
    pub fn get_movie(&self, id: MovieId) -> Option<&MovieRecord> {
        self.movies.get(&id)
    }

    /// Gets an owned copy of a movie by id.
    pub fn get_movie_cloned(&self, id: MovieId) -> Option<MovieRecord> {
        self.get_movie(id).cloned()
    }

    /// Gets a performer by id.
    pub fn get_performer(&self, id: PerformerId) -> Option<&PerformerRecord> {
        self.performers.get(&id)
    }

    /// Gets an owned copy of a performer by id.
    pub fn get_performer_cloned(&self, id: PerformerId) -> Option<PerformerRecord> {
        self.get_performer(id).cloned()
    }

    /// Movie ids in display order.
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_order
    }

    /// Performer ids in display order.
    pub fn performer_ids(&self) -> &[PerformerId] {
        &self.performer_order
    }

    /// Movies in display order.
    pub fn movies(&self) -> Vec<&MovieRecord> {
        self.movie_order
            .iter()
            .filter_map(|id| self.movies.get(id))
            .collect()
    }

    /// Owned copies of the movies in display order.
    pub fn movies_cloned(&self) -> Vec<MovieRecord> {
        self.movies().into_iter().cloned().collect()
    }

    /// Performers in display order.
    pub fn performers(&self) -> Vec<&PerformerRecord> {
        self.performer_order
            .iter()
            .filter_map(|id| self.performers.get(id))
            .collect()
    }

    /// Owned copies of the performers in display order.
    pub fn performers_cloned(&self) -> Vec<PerformerRecord> {
        self.performers().into_iter().cloned().collect()
    }

    /// True when the store has unsaved mutations.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn movie_mut(&mut self, id: MovieId) -> Result<&mut MovieRecord, StoreError> {
        self.movies.get_mut(&id).ok_or(StoreError::MissingMovie(id))
    }

    pub(crate) fn performer_mut(
        &mut self,
        id: PerformerId,
    ) -> Result<&mut PerformerRecord, StoreError> {
        self.performers
            .get_mut(&id)
            .ok_or(StoreError::MissingPerformer(id))
    }

    pub(crate) fn set_dirty(&mut self) {
        self.dirty = true;
    }

    fn drop_performer_entry(&mut self, id: PerformerId) {
        if let Some(rec) = self.performers.remove(&id) {
            Self::remove_from_vec_index(&mut self.performer_order, id);
            Self::remove_from_vec_index(self.by_name.entry(rec.full_name()).or_default(), id);
        }
    }

    fn remove_from_vec_index<T: PartialEq + Copy>(v: &mut Vec<T>, value: T) {
        if let Some(pos) = v.iter().position(|x| *x == value) {
            v.remove(pos);
        }
    }
}
