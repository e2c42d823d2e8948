// ============================================
// Hybrid Recommendation Engine
// ============================================
//
// Pipeline per request:
//   1. Fetch favorites / feedback / view history concurrently (bounded reads)
//   2. No behavioral data at all → popularity fallback (flagged)
//   3. Fetch peer activity and candidate recipes concurrently
//   4. Build preference profile and rating matrix
//   5. Content and collaborative scoring in parallel blocking tasks
//   6. Dynamic weights → fusion → top N
//
// Failed or timed-out reads degrade to empty data; only a blank user id is
// reported to the caller.

use crate::config::RecommendationConfig;
use crate::db::{RecommendationStore, StoreResult};
use crate::error::{DataSource, RecommendationError, Result, StoreError};
use crate::metrics;
use crate::models::{
    is_valid_rating, BlendWeights, Favorite, Feedback, RecipeCategory, RecipeView,
    RecommendationResponse, RecommendedRecipe, ScoredRecipe,
};
use crate::services::collaborative_filtering::{
    user_ratings, CollaborativeConfig, CollaborativeScorer, RatingMatrix,
};
use crate::services::content_based::ContentScorer;
use crate::services::dynamic_weights::{calculate_weights, BehaviorSummary};
use crate::services::fallback_ranking::rank_popular;
use crate::services::hybrid_ranker::fuse;
use crate::services::profile_builder::build_profile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const PATH_PERSONALIZED: &str = "personalized";
const PATH_FALLBACK: &str = "fallback";
const PATH_EMPTY: &str = "empty";

/// Ranked recommendations grouped by recipe category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecommendations {
    pub categories: BTreeMap<RecipeCategory, Vec<RecommendedRecipe>>,
    pub is_fallback: bool,
    pub weights_used: BlendWeights,
}

/// The requesting user's own behavioral records
struct UserActivity {
    favorites: Vec<Favorite>,
    feedback: Vec<Feedback>,
    views: Vec<RecipeView>,
}

impl UserActivity {
    fn summary(&self) -> BehaviorSummary {
        BehaviorSummary {
            favorites: self.favorites.len(),
            views: self.views.len(),
            ratings: self
                .feedback
                .iter()
                .map(|f| f.rating)
                .filter(|r| is_valid_rating(*r))
                .collect(),
        }
    }
}

pub struct RecommendationEngine<S: RecommendationStore> {
    store: Arc<S>,
    config: RecommendationConfig,
}

impl<S: RecommendationStore> RecommendationEngine<S> {
    pub fn new(store: Arc<S>, config: RecommendationConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Top `limit` recipes for a user, each with scores and reasons
    ///
    /// Users without any favorites, views or feedback get the popularity
    /// ranking with `is_fallback` set. `limit` is clamped to `max_limit`.
    pub async fn recommend(&self, user_id: &str, limit: usize) -> Result<RecommendationResponse> {
        let user_id = validate_user_id(user_id)?;
        let limit = self.config.effective_limit(limit);

        if limit == 0 {
            metrics::record_request(PATH_EMPTY);
            return Ok(RecommendationResponse::empty(calculate_weights(
                &BehaviorSummary::default(),
            )));
        }

        let pool_size = limit.saturating_mul(self.config.fallback_pool_multiplier);
        self.compute(user_id, limit, pool_size).await
    }

    /// `recommend` with the configured default limit
    pub async fn recommend_default(&self, user_id: &str) -> Result<RecommendationResponse> {
        self.recommend(user_id, self.config.default_limit).await
    }

    /// Up to `per_category` recipes for every recipe category
    ///
    /// Runs the pipeline once and partitions the ranked list, so the rating
    /// matrix and profile are built a single time. Recipes without a category
    /// are left out.
    pub async fn recommend_by_category(
        &self,
        user_id: &str,
        per_category: usize,
    ) -> Result<CategoryRecommendations> {
        let user_id = validate_user_id(user_id)?;
        let per_category = self.config.effective_limit(per_category);

        let response = if per_category == 0 {
            metrics::record_request(PATH_EMPTY);
            RecommendationResponse::empty(calculate_weights(&BehaviorSummary::default()))
        } else {
            let pool_size = per_category
                .saturating_mul(RecipeCategory::ALL.len())
                .saturating_mul(self.config.fallback_pool_multiplier);
            self.compute(user_id, usize::MAX, pool_size).await?
        };

        let mut categories: BTreeMap<RecipeCategory, Vec<RecommendedRecipe>> = BTreeMap::new();
        for item in response.items {
            let Some(category) = item.recipe.category else {
                continue;
            };
            let bucket = categories.entry(category).or_default();
            if bucket.len() < per_category {
                bucket.push(item);
            }
        }

        Ok(CategoryRecommendations {
            categories,
            is_fallback: response.is_fallback,
            weights_used: response.weights_used,
        })
    }

    async fn compute(
        &self,
        user_id: &str,
        limit: usize,
        fallback_pool: usize,
    ) -> Result<RecommendationResponse> {
        let started = Instant::now();

        let activity = self.load_user_activity(user_id).await;
        let summary = activity.summary();
        let weights = calculate_weights(&summary);

        if summary.is_empty() {
            debug!(
                error = %RecommendationError::InsufficientUserData(user_id.to_string()),
                "Switching to popularity fallback"
            );
            let response = self.popularity_fallback(user_id, limit, fallback_pool, weights).await;
            metrics::record_duration(PATH_FALLBACK, started.elapsed());
            return Ok(response);
        }

        let favorite_ids: Vec<String> = activity
            .favorites
            .iter()
            .map(|f| f.recipe.id.clone())
            .collect();

        let (peers, candidates) = tokio::join!(
            self.fetch(DataSource::PeerActivity, user_id, self.store.get_peer_activity(user_id)),
            self.fetch(
                DataSource::CandidateRecipes,
                user_id,
                self.store.get_candidate_recipes(&favorite_ids)
            ),
        );

        if candidates.is_empty() {
            info!(
                user_id = %user_id,
                error = %RecommendationError::NoCandidateItems,
                "Returning empty recommendation list"
            );
            metrics::record_request(PATH_EMPTY);
            return Ok(RecommendationResponse::empty(weights));
        }

        let profile = build_profile(&activity.favorites, &activity.views, &activity.feedback);
        let own_ratings = user_ratings(&activity.favorites, &activity.feedback);
        let matrix = RatingMatrix::from_peer_activity(&peers);
        let favorite_recipes: Vec<_> = activity.favorites.into_iter().map(|f| f.recipe).collect();
        let candidates = Arc::new(candidates);

        let content_task: JoinHandle<Vec<ScoredRecipe>> = {
            let candidates = Arc::clone(&candidates);
            tokio::task::spawn_blocking(move || {
                ContentScorer::new().score(&profile, &favorite_recipes, &candidates)
            })
        };

        let collaborative_task: JoinHandle<Vec<ScoredRecipe>> = {
            let candidates = Arc::clone(&candidates);
            let config = CollaborativeConfig {
                max_similar_users: self.config.max_similar_users,
                min_user_similarity: self.config.min_user_similarity,
            };
            tokio::task::spawn_blocking(move || {
                CollaborativeScorer::new(config).score(&own_ratings, &matrix, &candidates)
            })
        };

        let (content, collaborative) = tokio::join!(content_task, collaborative_task);
        let content = join_or_empty(content, "content", user_id);
        let collaborative = join_or_empty(collaborative, "collaborative", user_id);

        metrics::record_candidates("content", content.len());
        metrics::record_candidates("collaborative", collaborative.len());

        let items = fuse(content, collaborative, &weights, limit);
        metrics::record_candidates("fused", items.len());
        metrics::record_request(PATH_PERSONALIZED);
        metrics::record_duration(PATH_PERSONALIZED, started.elapsed());

        info!(
            user_id = %user_id,
            items = items.len(),
            content_weight = weights.content,
            collaborative_weight = weights.collaborative,
            data_quality = weights.data_quality,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Personalized recommendations generated"
        );

        Ok(RecommendationResponse {
            items,
            is_fallback: false,
            weights_used: weights,
        })
    }

    async fn load_user_activity(&self, user_id: &str) -> UserActivity {
        let (favorites, feedback, views) = tokio::join!(
            self.fetch(DataSource::Favorites, user_id, self.store.get_favorites(user_id)),
            self.fetch(DataSource::Feedback, user_id, self.store.get_feedback(user_id)),
            self.fetch(
                DataSource::ViewHistory,
                user_id,
                self.store
                    .get_view_history(user_id, self.config.view_history_limit)
            ),
        );

        debug!(
            user_id = %user_id,
            favorites = favorites.len(),
            feedback = feedback.len(),
            views = views.len(),
            "User activity loaded"
        );

        UserActivity {
            favorites,
            feedback,
            views,
        }
    }

    async fn popularity_fallback(
        &self,
        user_id: &str,
        limit: usize,
        pool_size: usize,
        weights: BlendWeights,
    ) -> RecommendationResponse {
        let pool = self
            .fetch(
                DataSource::PopularRecipes,
                user_id,
                self.store.get_popular_recipes(pool_size),
            )
            .await;

        let items = rank_popular(pool, limit);
        metrics::record_request(PATH_FALLBACK);

        info!(
            user_id = %user_id,
            items = items.len(),
            "Cold-start user served popularity fallback"
        );

        RecommendationResponse {
            items,
            is_fallback: true,
            weights_used: weights,
        }
    }

    /// Single-shot bounded read; failures and timeouts become empty data
    async fn fetch<T, F>(&self, source: DataSource, user_id: &str, read: F) -> T
    where
        T: Default,
        F: Future<Output = StoreResult<T>>,
    {
        let timeout = self.config.fetch_timeout();
        let error = match tokio::time::timeout(timeout, read).await {
            Ok(Ok(value)) => return value,
            Ok(Err(e)) => RecommendationError::unavailable(source, e),
            Err(_) => RecommendationError::unavailable(source, StoreError::Timeout(timeout)),
        };

        warn!(
            user_id = %user_id,
            source = %source,
            error = %error,
            "Store read failed, continuing without this source"
        );
        metrics::record_source_failure(source.as_str());

        T::default()
    }
}

fn validate_user_id(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(RecommendationError::InvalidRequest(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn join_or_empty(
    joined: std::result::Result<Vec<ScoredRecipe>, tokio::task::JoinError>,
    signal: &str,
    user_id: &str,
) -> Vec<ScoredRecipe> {
    match joined {
        Ok(scored) => scored,
        Err(e) => {
            warn!(
                user_id = %user_id,
                signal = signal,
                error = %e,
                "Scoring task failed, continuing without this signal"
            );
            Vec::new()
        }
    }
}
