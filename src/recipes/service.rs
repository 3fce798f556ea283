//! Recipe Service
//!
//! Serves recipe requests cheapest-first: exact cache hit, then the closest
//! cached recipe for a similar query, then the generator.

use serde_json::Value;
use tracing::info;

use super::generator::RecipeGenerator;
use super::model::{GeneratedRecipe, RecipeOutcome, Source};
use crate::cache::{CacheStats, TtlCache};
use crate::dedup::Deduplicator;
use crate::error::{Result, ServiceError};
use crate::similarity::{query_similarity, RecipeQuery};

/// Cache namespace holding generated recipes.
pub const RECIPES_NAMESPACE: &str = "recipes";

/// Minimum query similarity for a cached recipe to stand in for a new one.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

// == Recipe Service ==
#[derive(Debug)]
pub struct RecipeService {
    dedup: Deduplicator<GeneratedRecipe>,
    similarity_threshold: f64,
}

impl RecipeService {
    /// Creates a service over `cache`. A threshold outside `[0, 1]` falls back
    /// to [`DEFAULT_SIMILARITY_THRESHOLD`].
    pub fn new(cache: TtlCache<GeneratedRecipe>, similarity_threshold: f64) -> Self {
        let similarity_threshold = if (0.0..=1.0).contains(&similarity_threshold) {
            similarity_threshold
        } else {
            DEFAULT_SIMILARITY_THRESHOLD
        };

        Self {
            dedup: Deduplicator::new(cache),
            similarity_threshold,
        }
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    // == Generate ==
    /// Returns a recipe for `query`, invoking `generator` only when nothing
    /// cached is close enough.
    ///
    /// A similar match is stored under the new query's key as well, so an
    /// identical repeat becomes an exact hit. The copy expires together with
    /// the entry it came from.
    pub async fn generate(
        &self,
        query: &RecipeQuery,
        generator: &dyn RecipeGenerator,
    ) -> Result<RecipeOutcome> {
        if query.is_blank() {
            return Err(ServiceError::InvalidRequest(
                "Query needs at least one of description, country, protein, taste or ingredients"
                    .to_string(),
            ));
        }

        let normalized = query.normalized();
        let query_ref = &normalized;
        let mut origin: (Source, Option<f64>) = (Source::Cache, None);
        let mut inherited_ttl: Option<u64> = None;
        let origin_slot = &mut origin;
        let ttl_slot = &mut inherited_ttl;

        let entry = self
            .dedup
            .execute(
                RECIPES_NAMESPACE,
                query_ref,
                move || async move {
                    if let Some((similar, score, ttl_ms)) = self.best_similar(query_ref).await {
                        *origin_slot = (Source::Similar, Some(score));
                        *ttl_slot = Some(ttl_ms);
                        return Ok(similar);
                    }

                    let recipe = generator.generate(query_ref).await?;
                    *origin_slot = (Source::Generated, None);
                    Ok::<_, ServiceError>(GeneratedRecipe::new(query_ref.clone(), recipe))
                },
                None,
            )
            .await?;

        if let Some(ttl_ms) = inherited_ttl {
            self.dedup
                .store(RECIPES_NAMESPACE, &normalized, entry.clone(), Some(ttl_ms))
                .await;
        }

        let (source, similarity) = origin;
        info!(source = ?source, title = %entry.recipe.title, "Recipe served");

        Ok(RecipeOutcome {
            source,
            similarity,
            recipe: entry.recipe,
            generated_at: entry.generated_at,
        })
    }

    // == Find Similar ==
    /// Best live cached recipe whose query scores at least the threshold.
    pub async fn find_similar(&self, query: &RecipeQuery) -> Option<(GeneratedRecipe, f64)> {
        self.best_similar(query)
            .await
            .map(|(entry, score, _)| (entry, score))
    }

    /// Like [`find_similar`](Self::find_similar), plus the match's remaining TTL.
    async fn best_similar(&self, query: &RecipeQuery) -> Option<(GeneratedRecipe, f64, u64)> {
        let threshold = self.similarity_threshold;
        self.dedup
            .with_cache(|cache| {
                cache
                    .valid_entries_in(RECIPES_NAMESPACE)
                    .map(|(key, entry)| (key, entry, query_similarity(query, &entry.query)))
                    .filter(|(_, _, score)| *score >= threshold)
                    .max_by(|a, b| a.2.total_cmp(&b.2))
                    .and_then(|(key, entry, score)| {
                        let ttl_ms = cache.ttl_remaining_ms(key)?;
                        Some((entry.clone(), score, ttl_ms))
                    })
            })
            .await
    }

    // == Invalidate ==
    /// Drops cached entries under `namespace`, or just the one for `params`.
    ///
    /// Params for the recipes namespace are read as a [`RecipeQuery`] and
    /// normalized, so they match however the original request was spelled.
    pub async fn invalidate(&self, namespace: &str, params: Option<&Value>) -> usize {
        let normalized = match params {
            Some(params) if namespace == RECIPES_NAMESPACE => {
                serde_json::from_value::<RecipeQuery>(params.clone())
                    .ok()
                    .and_then(|query| serde_json::to_value(query.normalized()).ok())
            }
            _ => None,
        };

        self.dedup
            .invalidate(namespace, normalized.as_ref().or(params))
            .await
    }

    /// Drops every cached recipe, e.g. after the recipe prompt changes.
    pub async fn invalidate_all(&self) -> usize {
        self.invalidate(RECIPES_NAMESPACE, None).await
    }

    pub async fn clean_expired(&self) -> usize {
        self.dedup.clean_expired().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.dedup.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::recipes::{DraftRecipeGenerator, Recipe};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts calls and delegates to the draft generator.
    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecipeGenerator for CountingGenerator {
        async fn generate(&self, query: &RecipeQuery) -> Result<Recipe> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DraftRecipeGenerator.generate(query).await
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl RecipeGenerator for FailingGenerator {
        async fn generate(&self, _query: &RecipeQuery) -> Result<Recipe> {
            Err(ServiceError::Upstream("model overloaded".to_string()))
        }
    }

    fn service() -> (RecipeService, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = TtlCache::with_clock(100, 3_600_000, Arc::new(clock.clone()));
        (RecipeService::new(cache, DEFAULT_SIMILARITY_THRESHOLD), clock)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn request_a() -> RecipeQuery {
        RecipeQuery {
            description: "spicy chicken".to_string(),
            country: "Thai".to_string(),
            protein: "Chicken".to_string(),
            taste: strings(&["Spicy", "Sour"]),
            ingredients: strings(&["chicken", "chili", "garlic"]),
        }
    }

    #[tokio::test]
    async fn test_reordered_and_recased_request_is_a_cache_hit() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        let first = service.generate(&request_a(), &generator).await.unwrap();
        assert_eq!(first.source, Source::Generated);

        let request_b = RecipeQuery {
            description: "Spicy CHICKEN".to_string(),
            taste: strings(&["Sour", "Spicy"]),
            ..request_a()
        };
        let second = service.generate(&request_b, &generator).await.unwrap();

        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.recipe, first.recipe);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_similar_request_reuses_cached_recipe() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        let first = service.generate(&request_a(), &generator).await.unwrap();

        // One extra ingredient: everything else matches.
        let close = RecipeQuery {
            ingredients: strings(&["chicken", "chili", "garlic", "basil"]),
            ..request_a()
        };
        let second = service.generate(&close, &generator).await.unwrap();

        assert_eq!(second.source, Source::Similar);
        assert!(second.similarity.unwrap() >= DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(second.recipe, first.recipe);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        // The similar answer is now stored under the new query too.
        let third = service.generate(&close, &generator).await.unwrap();
        assert_eq!(third.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_description_less_queries_match_on_fuzzy_ingredient() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        let base = RecipeQuery {
            country: "Thai".to_string(),
            protein: "Chicken".to_string(),
            taste: strings(&["spicy"]),
            ingredients: strings(&["chicken", "chili"]),
            ..RecipeQuery::default()
        };
        let respelled = RecipeQuery {
            ingredients: strings(&["chicken", "chilli"]),
            ..base.clone()
        };

        service.generate(&base, &generator).await.unwrap();
        let outcome = service.generate(&respelled, &generator).await.unwrap();

        assert_eq!(outcome.source, Source::Similar);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_similar_copy_expires_with_its_source() {
        let (service, clock) = service();
        let generator = CountingGenerator::default();
        let close = RecipeQuery {
            ingredients: strings(&["chicken", "chili", "garlic", "basil"]),
            ..request_a()
        };

        service.generate(&request_a(), &generator).await.unwrap();
        clock.advance(3_000_000);
        let similar = service.generate(&close, &generator).await.unwrap();
        assert_eq!(similar.source, Source::Similar);

        // Past the original's TTL, well inside a fresh one.
        clock.advance(600_001);
        let outcome = service.generate(&close, &generator).await.unwrap();

        assert_eq!(outcome.source, Source::Generated);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_single_recipe_by_raw_query() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        service.generate(&request_a(), &generator).await.unwrap();
        let raw = serde_json::json!({
            "country": "Thai",
            "protein": "Chicken",
            "description": "Spicy Chicken",
            "taste": ["Sour", "Spicy"],
            "ingredients": ["garlic", "chili", "chicken"]
        });

        assert_eq!(service.invalidate(RECIPES_NAMESPACE, Some(&raw)).await, 1);
        let outcome = service.generate(&request_a(), &generator).await.unwrap();
        assert_eq!(outcome.source, Source::Generated);
    }

    #[tokio::test]
    async fn test_different_request_is_generated() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        service.generate(&request_a(), &generator).await.unwrap();
        let other = RecipeQuery {
            description: "mushroom risotto".to_string(),
            country: "Italy".to_string(),
            protein: "None".to_string(),
            taste: strings(&["Savory"]),
            ingredients: strings(&["arborio", "mushroom"]),
        };
        let outcome = service.generate(&other, &generator).await.unwrap();

        assert_eq!(outcome.source, Source::Generated);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_recipe_is_regenerated() {
        let (service, clock) = service();
        let generator = CountingGenerator::default();

        service.generate(&request_a(), &generator).await.unwrap();
        clock.advance(3_600_001);
        let outcome = service.generate(&request_a(), &generator).await.unwrap();

        assert_eq!(outcome.source, Source::Generated);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        let blank = RecipeQuery {
            description: "   ".to_string(),
            ..RecipeQuery::default()
        };
        let result = service.generate(&blank, &generator).await;

        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_propagates_and_is_not_cached() {
        let (service, _) = service();

        let result = service.generate(&request_a(), &FailingGenerator).await;
        assert_eq!(
            result.unwrap_err(),
            ServiceError::Upstream("model overloaded".to_string())
        );
        assert_eq!(service.stats().await.total_entries, 0);

        let generator = CountingGenerator::default();
        let outcome = service.generate(&request_a(), &generator).await.unwrap();
        assert_eq!(outcome.source, Source::Generated);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (service, _) = service();
        let generator = CountingGenerator::default();

        service.generate(&request_a(), &generator).await.unwrap();
        assert_eq!(service.invalidate_all().await, 1);

        let outcome = service.generate(&request_a(), &generator).await.unwrap();
        assert_eq!(outcome.source, Source::Generated);
    }

    #[test]
    fn test_out_of_range_threshold_falls_back() {
        let cache = TtlCache::new(10, 1_000);
        let service = RecipeService::new(cache, 1.5);
        assert_eq!(service.similarity_threshold(), DEFAULT_SIMILARITY_THRESHOLD);
    }
}
