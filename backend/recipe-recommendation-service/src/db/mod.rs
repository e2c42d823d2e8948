//! Storage collaborator seam
//!
//! The engine only reads through `RecommendationStore`; persistence, querying
//! and retries belong to the implementation. `SnapshotStore` serves a fixed
//! in-memory snapshot.

pub mod snapshot;

pub use snapshot::{FavoriteRow, FeedbackRow, Snapshot, SnapshotStore, ViewRow};

use crate::error::StoreError;
use crate::models::{Favorite, Feedback, PeerActivity, PopularRecipe, Recipe, RecipeView};
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read operations the recommendation engine needs from storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Favorites of a user, each resolved to its recipe
    async fn get_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>>;

    /// Explicit ratings of a user, each resolved to its recipe
    async fn get_feedback(&self, user_id: &str) -> StoreResult<Vec<Feedback>>;

    /// Most recent recipe views of a user
    async fn get_view_history(&self, user_id: &str, limit: usize) -> StoreResult<Vec<RecipeView>>;

    /// Favorites and feedback of every other user
    async fn get_peer_activity(&self, exclude_user_id: &str) -> StoreResult<PeerActivity>;

    /// Catalog recipes except the given ids
    async fn get_candidate_recipes(&self, excluding: &[String]) -> StoreResult<Vec<Recipe>>;

    /// Pool of popular recipes with their rating statistics
    ///
    /// Implementations return the first `limit` entries of the whole catalog in
    /// `fallback_ranking::compare_popularity` order.
    async fn get_popular_recipes(&self, limit: usize) -> StoreResult<Vec<PopularRecipe>>;
}
