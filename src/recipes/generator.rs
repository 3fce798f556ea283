//! Recipe Generators
//!
//! The producer side of recipe generation. The LLM-backed generator lives
//! outside this crate and plugs in through [`RecipeGenerator`].

use async_trait::async_trait;

use super::model::Recipe;
use crate::error::Result;
use crate::similarity::RecipeQuery;

// == Generator Trait ==
/// Turns a query into a recipe. Implementations are expensive and rate-limited
/// upstream, which is why calls go through the cache first.
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Produces a recipe for an already-normalized query.
    async fn generate(&self, query: &RecipeQuery) -> Result<Recipe>;
}

// == Draft Generator ==
/// Offline generator that lays out a recipe outline from the query alone.
///
/// Lets the server run without an upstream model configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DraftRecipeGenerator;

#[async_trait]
impl RecipeGenerator for DraftRecipeGenerator {
    async fn generate(&self, query: &RecipeQuery) -> Result<Recipe> {
        let mut ingredients = query.ingredients.clone();
        if !query.protein.is_empty() && !ingredients.contains(&query.protein) {
            ingredients.insert(0, query.protein.clone());
        }

        let title = if query.description.is_empty() {
            title_case(&format!("{} {} plate", query.country, query.protein))
        } else {
            title_case(&query.description)
        };

        let mut steps = Vec::new();
        if !ingredients.is_empty() {
            steps.push(format!("Prepare the {}.", ingredients.join(", ")));
        }
        if !query.protein.is_empty() {
            steps.push(format!("Cook the {} until done.", query.protein));
        }
        if !query.taste.is_empty() {
            steps.push(format!("Adjust the seasoning so it reads {}.", query.taste.join(" and ")));
        }
        steps.push(if query.country.is_empty() {
            "Plate and serve.".to_string()
        } else {
            format!("Serve {}-style.", title_case(&query.country))
        });

        Ok(Recipe {
            summary: format!("A draft outline for {}.", title.to_lowercase()),
            title,
            cuisine: query.country.clone(),
            protein: query.protein.clone(),
            taste: query.taste.clone(),
            ingredients,
            steps,
        })
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
