//! Recipe Query Module
//!
//! The multi-field request behind recipe generation, its canonical form, and the
//! weighted similarity used to find "close enough" cached recipes.

use serde::{Deserialize, Serialize};

use super::distance::{set_similarity, string_similarity};
use super::fingerprint::fingerprint;

// == Weights ==
/// Weight of an exact `country` match
pub const COUNTRY_WEIGHT: f64 = 0.25;
/// Weight of an exact `protein` match
pub const PROTEIN_WEIGHT: f64 = 0.25;
/// Weight of the fuzzy `description` match
pub const DESCRIPTION_WEIGHT: f64 = 0.20;
/// Weight of the `taste` tag overlap
pub const TASTE_WEIGHT: f64 = 0.15;
/// Weight of the `ingredients` overlap
pub const INGREDIENTS_WEIGHT: f64 = 0.15;

/// Taste tags are short words, so only near-identical spellings count.
pub const TASTE_THRESHOLD: f64 = 0.9;
/// Ingredient names come from free text and tolerate more drift.
pub const INGREDIENTS_THRESHOLD: f64 = 0.7;

// == Recipe Query ==
/// What a visitor asked the recipe generator for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeQuery {
    /// Free-text description, e.g. "spicy chicken"
    pub description: String,
    /// Cuisine by country, e.g. "Thai"
    pub country: String,
    /// Main protein, e.g. "Chicken"
    pub protein: String,
    /// Taste tags, e.g. ["Spicy", "Sour"]
    pub taste: Vec<String>,
    /// Ingredients the visitor wants used
    pub ingredients: Vec<String>,
}

impl RecipeQuery {
    /// Returns the canonical form: strings trimmed and lowercased, lists with
    /// blank items dropped, sorted and deduplicated.
    pub fn normalized(&self) -> Self {
        Self {
            description: normalize_text(&self.description),
            country: normalize_text(&self.country),
            protein: normalize_text(&self.protein),
            taste: normalize_list(&self.taste),
            ingredients: normalize_list(&self.ingredients),
        }
    }

    /// True when no field carries anything after normalization.
    pub fn is_blank(&self) -> bool {
        let n = self.normalized();
        n.description.is_empty()
            && n.country.is_empty()
            && n.protein.is_empty()
            && n.taste.is_empty()
            && n.ingredients.is_empty()
    }
}

fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_list(values: &[String]) -> Vec<String> {
    let mut items: Vec<String> = values
        .iter()
        .map(|v| normalize_text(v))
        .filter(|v| !v.is_empty())
        .collect();
    items.sort();
    items.dedup();
    items
}

// == Query Similarity ==
/// Weighted similarity of two queries in `[0, 1]`.
///
/// Country and protein count when equal after normalization, so two queries
/// that both leave one out still match on it. The description contributes its
/// string similarity, which is 1.0 for two empty descriptions. List facets
/// score 0 when either side is empty.
pub fn query_similarity(a: &RecipeQuery, b: &RecipeQuery) -> f64 {
    let a = a.normalized();
    let b = b.normalized();
    let mut score = 0.0;

    if a.country == b.country {
        score += COUNTRY_WEIGHT;
    }
    if a.protein == b.protein {
        score += PROTEIN_WEIGHT;
    }
    score += string_similarity(&a.description, &b.description) * DESCRIPTION_WEIGHT;
    score += set_similarity(&a.taste, &b.taste, TASTE_THRESHOLD) * TASTE_WEIGHT;
    score += set_similarity(&a.ingredients, &b.ingredients, INGREDIENTS_THRESHOLD)
        * INGREDIENTS_WEIGHT;

    score.min(1.0)
}

// == Normalized Query Hash ==
/// Short deterministic hash of the normalized query.
pub fn normalized_query_hash(query: &RecipeQuery) -> String {
    let canonical = serde_json::to_string(&query.normalized()).unwrap_or_default();
    fingerprint(&canonical)
}
