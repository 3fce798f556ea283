//! Recipes Module
//!
//! Recipe generation behind the request deduplicator and query similarity.

mod generator;
mod model;
mod service;

pub use generator::{DraftRecipeGenerator, RecipeGenerator};
pub use model::{GeneratedRecipe, Recipe, RecipeOutcome, Source};
pub use service::{RecipeService, DEFAULT_SIMILARITY_THRESHOLD, RECIPES_NAMESPACE};
