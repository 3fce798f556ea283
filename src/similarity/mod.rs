//! Similarity Module
//!
//! Fuzzy string and query matching used to find approximate cache hits, plus
//! the short fingerprints cache keys are built from.

mod distance;
mod fingerprint;
mod query;

pub use distance::{
    fuzzy_includes, levenshtein, set_similarity, string_similarity, DEFAULT_FUZZY_THRESHOLD,
};
pub use fingerprint::{fingerprint, rolling_hash};
pub use query::{
    normalized_query_hash, query_similarity, RecipeQuery, COUNTRY_WEIGHT, DESCRIPTION_WEIGHT,
    INGREDIENTS_THRESHOLD, INGREDIENTS_WEIGHT, PROTEIN_WEIGHT, TASTE_THRESHOLD, TASTE_WEIGHT,
};
