//! Shared primitive ids, rating bounds, and list string helpers.

/// Stable movie identifier.
pub type MovieId = u64;
/// Stable performer identifier.
pub type PerformerId = u64;
/// Personal rating on the 0..=100 scale; 0 means unset.
pub type Rating = u32;

/// Upper bound of the rating scale.
pub const RATING_MAX: Rating = 100;

/// Clamps a rating into the 0..=100 range.
pub fn clamp_rating(value: Rating) -> Rating {
    value.min(RATING_MAX)
}

/// Splits a comma-separated string into trimmed, non-empty elements.
///
/// This is the canonical text form used for alternative titles, filming
/// locations, and alternate names when interchanging with line editors.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins list elements back into the canonical comma-separated form.
///
/// `split_list` followed by `join_list` is stable up to whitespace
/// normalization around the commas.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}
