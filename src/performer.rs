//! Performer domain record, draft, and patch types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{MovieId, PerformerId, Rating, clamp_rating};

/// Fully materialized, authoritative performer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerRecord {
    /// Stable performer identifier.
    pub id: PerformerId,
    /// First name; may be empty for mononyms.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Free-form biography.
    pub biography: String,
    /// Country of origin.
    pub country: String,
    /// Ordered alternate names.
    pub alternate_names: Vec<String>,
    /// Date of birth, if known.
    pub date_of_birth: Option<NaiveDate>,
    /// Personal rating; 0 means unset.
    pub rating: Rating,
    /// External database identifier, e.g. "nm0000199".
    pub external_id: Option<String>,
    /// Ordered ids of linked movies. Derived from the movie side of the
    /// relationship and rebuilt during load, never stored.
    #[serde(skip)]
    pub movies: Vec<MovieId>,
}

impl PerformerRecord {
    /// Full display name used by the name index, "first last" with the
    /// space omitted when the first name is empty.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Insert payload used to create a new [`PerformerRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerformerDraft {
    /// First name; may be empty for mononyms.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Free-form biography.
    pub biography: String,
    /// Country of origin.
    pub country: String,
    /// Ordered alternate names.
    pub alternate_names: Vec<String>,
    /// Date of birth, if known.
    pub date_of_birth: Option<NaiveDate>,
    /// Personal rating; clamped into range on insert.
    pub rating: Rating,
    /// External database identifier.
    pub external_id: Option<String>,
}

/// Sparse patch where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerformerPatch {
    /// Optional replacement for the first name.
    pub first_name: Option<String>,
    /// Optional replacement for the last name.
    pub last_name: Option<String>,
    /// Optional replacement for the biography.
    pub biography: Option<String>,
    /// Optional replacement for the country.
    pub country: Option<String>,
    /// Optional replacement for the alternate names.
    pub alternate_names: Option<Vec<String>>,
    /// Optional replacement for the date of birth; `Some(None)` clears it.
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Optional replacement for the rating.
    pub rating: Option<Rating>,
    /// Optional replacement for the external id; `Some(None)` clears it.
    pub external_id: Option<Option<String>>,
}

impl PerformerPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`, clamping the rating.
    pub fn apply_to(&self, rec: &mut PerformerRecord) {
        if let Some(v) = &self.first_name {
            rec.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            rec.last_name = v.clone();
        }
        if let Some(v) = &self.biography {
            rec.biography = v.clone();
        }
        if let Some(v) = &self.country {
            rec.country = v.clone();
        }
        if let Some(v) = &self.alternate_names {
            rec.alternate_names = v.clone();
        }
        if let Some(v) = self.date_of_birth {
            rec.date_of_birth = v;
        }
        if let Some(v) = self.rating {
            rec.rating = clamp_rating(v);
        }
        if let Some(v) = &self.external_id {
            rec.external_id = v.clone();
        }
    }
}
