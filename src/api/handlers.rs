//! API Handlers
//!
//! HTTP request handlers for each recipe cache endpoint.

use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{extract::State, http::HeaderMap, Json};
use tracing::warn;

use crate::cache::TtlCache;
use crate::clock::{system_clock, SharedClock};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::models::{HealthResponse, InvalidateRequest, InvalidateResponse, StatsResponse};
use crate::recipes::{DraftRecipeGenerator, RecipeGenerator, RecipeOutcome, RecipeService};
use crate::similarity::RecipeQuery;

/// Fallback rate-limit key when no client address header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Application state shared across all handlers.
///
/// The recipe service guards its own cache; the limiter sits behind a Mutex
/// because every check mutates it.
#[derive(Clone)]
pub struct AppState {
    /// Recipe cache, similarity lookup and generation
    pub recipes: Arc<RecipeService>,
    /// Per-client sliding-window limiter for generate requests
    pub limiter: Arc<Mutex<RateLimiter>>,
    /// Limits applied by `limiter`
    pub rate_limit: RateLimitConfig,
    /// Producer invoked on a cache miss
    pub generator: Arc<dyn RecipeGenerator>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        recipes: RecipeService,
        limiter: RateLimiter,
        rate_limit: RateLimitConfig,
        generator: Arc<dyn RecipeGenerator>,
    ) -> Self {
        Self {
            recipes: Arc::new(recipes),
            limiter: Arc::new(Mutex::new(limiter)),
            rate_limit,
            generator,
        }
    }

    /// Creates a new AppState from configuration, on the wall clock.
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Like [`AppState::from_config`], with cache and limiter reading `clock`.
    pub fn with_clock(config: &Config, clock: SharedClock) -> Self {
        let cache = TtlCache::with_clock(config.max_entries, config.default_ttl_ms, clock.clone());
        Self::new(
            RecipeService::new(cache, config.similarity_threshold),
            RateLimiter::with_clock(clock),
            config.rate_limit(),
            Arc::new(DraftRecipeGenerator),
        )
    }

    /// Swaps the producer, e.g. for an LLM-backed generator.
    pub fn with_generator(mut self, generator: Arc<dyn RecipeGenerator>) -> Self {
        self.generator = generator;
        self
    }
}

/// Client address for rate limiting: first `x-forwarded-for` hop, then
/// `x-real-ip`, then [`UNKNOWN_CLIENT`].
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Handler for POST /recipes/generate
///
/// Rate-limited per client address, then served cache-first.
pub async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<RecipeQuery>,
) -> Result<Json<RecipeOutcome>> {
    let client = client_ip(&headers);
    let decision = state
        .limiter
        .lock()
        .await
        .check(&format!("generate:{}", client), &state.rate_limit);

    if !decision.allowed {
        let retry_after = decision.retry_after.unwrap_or(1);
        warn!(client = %client, retry_after, "Recipe generation rate limited");
        return Err(ServiceError::RateLimited { retry_after });
    }

    let outcome = state
        .recipes
        .generate(&query, state.generator.as_ref())
        .await?;
    Ok(Json(outcome))
}

/// Handler for POST /cache/invalidate
///
/// Clears a namespace, or the single entry selected by `params`.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let removed = state
        .recipes
        .invalidate(&req.namespace, req.params.as_ref())
        .await;

    Ok(Json(InvalidateResponse::new(req.namespace, removed)))
}

/// Handler for GET /cache/stats
///
/// Sweeps expired entries first so the snapshot reflects live data.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let expired_cleaned = state.recipes.clean_expired().await;
    let stats = state.recipes.stats().await;

    Json(StatsResponse::new(stats, expired_cleaned))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
