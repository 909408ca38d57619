//! Merging a fetched metadata record into a catalog movie.

use chrono::NaiveDate;

use crate::{
    core::store::{CatalogStore, StoreError},
    movie::MoviePatch,
    performer::PerformerDraft,
    types::{MovieId, PerformerId},
};

use super::{
    SyncError,
    fetch::{MetadataRecord, MetadataSource, validate_external_id},
};

/// Human-readable date format used by the remote source, e.g. "16 Jul 2010".
pub const RELEASE_DATE_FORMAT: &str = "%d %b %Y";

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Names of movie fields that were updated.
    pub updated_fields: Vec<&'static str>,
    /// Existing performers linked to the movie.
    pub linked_performers: Vec<PerformerId>,
    /// Performers created and linked by the merge.
    pub created_performers: Vec<PerformerId>,
}

/// Fetches the record for `external_id` and merges it into `movie`.
///
/// The movie is untouched until a usable record is obtained: a malformed
/// identifier, an unreachable source, and a remote "not found" all abort
/// before any mutation.
pub fn synchronize(
    store: &mut CatalogStore,
    movie: MovieId,
    external_id: &str,
    source: &dyn MetadataSource,
) -> Result<MergeOutcome, SyncError> {
    if store.get_movie(movie).is_none() {
        return Err(StoreError::MissingMovie(movie).into());
    }
    validate_external_id(external_id)?;
    let record = source.fetch(external_id)?;
    Ok(apply_record(store, movie, &record)?)
}

/// Merges the resolvable fields of a fetched record into `movie`.
///
/// Absent fields and unparsable dates or runtimes are skipped without
/// failing the merge. Actors are linked to existing performers by full
/// name, or created and linked.
pub fn apply_record(
    store: &mut CatalogStore,
    movie: MovieId,
    record: &MetadataRecord,
) -> Result<MergeOutcome, StoreError> {
    store.get_movie(movie).ok_or(StoreError::MissingMovie(movie))?;

    let mut outcome = MergeOutcome::default();
    let mut patch = MoviePatch::default();

    if let Some(title) = record.get("Title") {
        patch.title = Some(title.to_string());
        outcome.updated_fields.push("title");
    }
    if let Some(text) = record.get("Released") {
        match NaiveDate::parse_from_str(text, RELEASE_DATE_FORMAT) {
            Ok(date) => {
                patch.release_date = Some(Some(date));
                outcome.updated_fields.push("release_date");
            }
            Err(err) => {
                tracing::debug!(value = text, %err, "skipping unparsable release date");
            }
        }
    }
    if let Some(text) = record.get("Runtime") {
        match parse_runtime_minutes(text) {
            Some(minutes) => {
                patch.runtime = Some(Some(minutes));
                outcome.updated_fields.push("runtime");
            }
            None => {
                tracing::debug!(value = text, "skipping unparsable runtime");
            }
        }
    }
    if let Some(country) = record.get("Country") {
        patch.country = Some(country.to_string());
        outcome.updated_fields.push("country");
    }
    if let Some(plot) = record.get("Plot") {
        patch.description = Some(plot.to_string());
        outcome.updated_fields.push("description");
    }
    if let Some(language) = record.get("Language") {
        patch.language = Some(language.to_string());
        outcome.updated_fields.push("language");
    }

    store.update_movie(movie, patch)?;

    if let Some(actors) = record.get("Actors") {
        for name in actors.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match store.find_performer_by_name(name).map(|p| p.id) {
                Some(id) => {
                    store.link(movie, id)?;
                    outcome.linked_performers.push(id);
                }
                None => {
                    let (first_name, last_name) = split_actor_name(name);
                    let id = store.add_performer(PerformerDraft {
                        first_name,
                        last_name,
                        ..PerformerDraft::default()
                    });
                    store.link(movie, id)?;
                    outcome.created_performers.push(id);
                }
            }
        }
    }

    Ok(outcome)
}

/// Parses a trailing-unit runtime string such as "120 min" into minutes.
fn parse_runtime_minutes(text: &str) -> Option<u32> {
    text.split_whitespace().next()?.parse().ok()
}

/// Splits a full name at the last space into (first, last); a single-word
/// name becomes a last name with an empty first name.
fn split_actor_name(name: &str) -> (String, String) {
    match name.rsplit_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (String::new(), name.to_string()),
    }
}
