//! Recipe payloads stored in the cache and returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::similarity::RecipeQuery;

/// A recipe as produced by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub summary: String,
    pub cuisine: String,
    pub protein: String,
    pub taste: Vec<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Cache payload: a recipe together with the normalized query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub query: RecipeQuery,
    pub recipe: Recipe,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedRecipe {
    pub fn new(query: RecipeQuery, recipe: Recipe) -> Self {
        Self {
            query,
            recipe,
            generated_at: Utc::now(),
        }
    }
}

/// Where a returned recipe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Exact hit on the normalized query
    Cache,
    /// Close-enough cached recipe for a different query
    Similar,
    /// Freshly produced by the generator
    Generated,
}

/// Result of a generate request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeOutcome {
    pub source: Source,
    /// Query similarity score, set for [`Source::Similar`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub recipe: Recipe,
    pub generated_at: DateTime<Utc>,
}
