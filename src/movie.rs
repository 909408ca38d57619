//! Movie domain record, draft, and patch types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{MovieId, PerformerId, Rating, clamp_rating};

/// Fully materialized, authoritative movie record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Stable movie identifier.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Free-form plot description.
    pub description: String,
    /// Country of origin.
    pub country: String,
    /// Spoken language.
    pub language: String,
    /// Runtime in minutes, if known.
    pub runtime: Option<u32>,
    /// Date the movie was last watched, if ever.
    pub watch_date: Option<NaiveDate>,
    /// Theatrical release date, if known.
    pub release_date: Option<NaiveDate>,
    /// Personal rating; 0 means unset.
    pub rating: Rating,
    /// Ordered filming locations.
    pub filming_locations: Vec<String>,
    /// Ordered alternative titles.
    pub alternative_titles: Vec<String>,
    /// External database identifier, e.g. "tt1375666".
    pub external_id: Option<String>,
    /// Ordered ids of linked performers. This is the stored side of the
    /// relationship; the performer side is rebuilt from it on load.
    pub performers: Vec<PerformerId>,
}

/// Insert payload used to create a new [`MovieRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieDraft {
    /// Display title.
    pub title: String,
    /// Free-form plot description.
    pub description: String,
    /// Country of origin.
    pub country: String,
    /// Spoken language.
    pub language: String,
    /// Runtime in minutes, if known.
    pub runtime: Option<u32>,
    /// Date the movie was last watched, if ever.
    pub watch_date: Option<NaiveDate>,
    /// Theatrical release date, if known.
    pub release_date: Option<NaiveDate>,
    /// Personal rating; clamped into range on insert.
    pub rating: Rating,
    /// Ordered filming locations.
    pub filming_locations: Vec<String>,
    /// Ordered alternative titles.
    pub alternative_titles: Vec<String>,
    /// External database identifier.
    pub external_id: Option<String>,
}

/// Sparse patch where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoviePatch {
    /// Optional replacement for the title.
    pub title: Option<String>,
    /// Optional replacement for the description.
    pub description: Option<String>,
    /// Optional replacement for the country.
    pub country: Option<String>,
    /// Optional replacement for the language.
    pub language: Option<String>,
    /// Optional replacement for the runtime; `Some(None)` clears it.
    pub runtime: Option<Option<u32>>,
    /// Optional replacement for the watch date; `Some(None)` clears it.
    pub watch_date: Option<Option<NaiveDate>>,
    /// Optional replacement for the release date; `Some(None)` clears it.
    pub release_date: Option<Option<NaiveDate>>,
    /// Optional replacement for the rating.
    pub rating: Option<Rating>,
    /// Optional replacement for the filming locations.
    pub filming_locations: Option<Vec<String>>,
    /// Optional replacement for the alternative titles.
    pub alternative_titles: Option<Vec<String>>,
    /// Optional replacement for the external id; `Some(None)` clears it.
    pub external_id: Option<Option<String>>,
}

impl MoviePatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`, clamping the rating.
    pub fn apply_to(&self, rec: &mut MovieRecord) {
        if let Some(v) = &self.title {
            rec.title = v.clone();
        }
        if let Some(v) = &self.description {
            rec.description = v.clone();
        }
        if let Some(v) = &self.country {
            rec.country = v.clone();
        }
        if let Some(v) = &self.language {
            rec.language = v.clone();
        }
        if let Some(v) = self.runtime {
            rec.runtime = v;
        }
        if let Some(v) = self.watch_date {
            rec.watch_date = v;
        }
        if let Some(v) = self.release_date {
            rec.release_date = v;
        }
        if let Some(v) = self.rating {
            rec.rating = clamp_rating(v);
        }
        if let Some(v) = &self.filming_locations {
            rec.filming_locations = v.clone();
        }
        if let Some(v) = &self.alternative_titles {
            rec.alternative_titles = v.clone();
        }
        if let Some(v) = &self.external_id {
            rec.external_id = v.clone();
        }
    }
}
