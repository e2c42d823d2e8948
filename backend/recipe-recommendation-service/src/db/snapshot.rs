use super::{RecommendationStore, StoreResult};
use crate::models::{
    Favorite, Feedback, PeerActivity, PeerFavorite, PeerFeedback, PopularRecipe, Recipe,
    RecipeView,
};
use crate::services::fallback_ranking::compare_popularity;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRow {
    pub user_id: String,
    pub recipe_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRow {
    pub user_id: String,
    pub recipe_id: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    pub user_id: String,
    pub recipe_id: String,
    pub viewed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

const SNAPSHOT_CLOCK_START: i64 = 1_700_000_000;

/// Bounded snapshot of catalog and behavioral data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub favorites: Vec<FavoriteRow>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRow>,
    #[serde(default)]
    pub views: Vec<ViewRow>,
    /// user_id → display name
    #[serde(default)]
    pub user_names: HashMap<String, String>,
}

impl Snapshot {
    pub fn add_recipe(&mut self, recipe: Recipe) -> &mut Self {
        self.recipes.push(recipe);
        self
    }

    pub fn add_favorite(&mut self, user_id: &str, recipe_id: &str) -> &mut Self {
        let created_at = self.next_timestamp();
        self.favorites.push(FavoriteRow {
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at,
        });
        self
    }

    pub fn add_feedback(&mut self, user_id: &str, recipe_id: &str, rating: u8) -> &mut Self {
        let created_at = self.next_timestamp();
        self.feedback.push(FeedbackRow {
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            rating,
            created_at,
        });
        self
    }

    pub fn add_view(&mut self, user_id: &str, recipe_id: &str) -> &mut Self {
        let viewed_at = self.next_timestamp();
        self.views.push(ViewRow {
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            viewed_at,
            duration_seconds: None,
            source: None,
        });
        self
    }

    pub fn set_user_name(&mut self, user_id: &str, name: &str) -> &mut Self {
        self.user_names
            .insert(user_id.to_string(), name.to_string());
        self
    }

    // Rows added later are treated as more recent; out of range falls back to the epoch
    fn next_timestamp(&self) -> DateTime<Utc> {
        let seq = (self.favorites.len() + self.feedback.len() + self.views.len()) as i64;
        DateTime::from_timestamp(SNAPSHOT_CLOCK_START + seq * 60, 0).unwrap_or_default()
    }
}

/// `RecommendationStore` over an immutable in-memory snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: Snapshot,
    recipes_by_id: HashMap<String, Recipe>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let recipes_by_id = snapshot
            .recipes
            .iter()
            .map(|recipe| (recipe.id.clone(), recipe.clone()))
            .collect();

        Self {
            snapshot,
            recipes_by_id,
        }
    }

    /// Load a JSON-serialized `Snapshot`
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse snapshot file {}", path.display()))?;

        info!(
            recipes = snapshot.recipes.len(),
            favorites = snapshot.favorites.len(),
            feedback = snapshot.feedback.len(),
            views = snapshot.views.len(),
            "Recommendation snapshot loaded"
        );

        Ok(Self::new(snapshot))
    }

    fn resolve(&self, recipe_id: &str) -> Option<Recipe> {
        let recipe = self.recipes_by_id.get(recipe_id).cloned();
        if recipe.is_none() {
            debug!(recipe_id = recipe_id, "Dropping row referencing unknown recipe");
        }
        recipe
    }

    fn display_name(&self, user_id: &str) -> Option<String> {
        self.snapshot.user_names.get(user_id).cloned()
    }
}

#[async_trait]
impl RecommendationStore for SnapshotStore {
    async fn get_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>> {
        let mut rows: Vec<&FavoriteRow> = self
            .snapshot
            .favorites
            .iter()
            .filter(|row| row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                self.resolve(&row.recipe_id).map(|recipe| Favorite {
                    user_id: row.user_id.clone(),
                    recipe,
                    created_at: row.created_at,
                })
            })
            .collect())
    }

    async fn get_feedback(&self, user_id: &str) -> StoreResult<Vec<Feedback>> {
        let mut rows: Vec<&FeedbackRow> = self
            .snapshot
            .feedback
            .iter()
            .filter(|row| row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                self.resolve(&row.recipe_id).map(|recipe| Feedback {
                    user_id: row.user_id.clone(),
                    recipe,
                    rating: row.rating,
                    created_at: row.created_at,
                })
            })
            .collect())
    }

    async fn get_view_history(&self, user_id: &str, limit: usize) -> StoreResult<Vec<RecipeView>> {
        let mut rows: Vec<&ViewRow> = self
            .snapshot
            .views
            .iter()
            .filter(|row| row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                self.resolve(&row.recipe_id).map(|recipe| RecipeView {
                    user_id: row.user_id.clone(),
                    recipe,
                    viewed_at: row.viewed_at,
                    duration_seconds: row.duration_seconds,
                    source: row.source.clone(),
                })
            })
            .take(limit)
            .collect())
    }

    async fn get_peer_activity(&self, exclude_user_id: &str) -> StoreResult<PeerActivity> {
        let favorites = self
            .snapshot
            .favorites
            .iter()
            .filter(|row| row.user_id != exclude_user_id)
            .map(|row| PeerFavorite {
                user_id: row.user_id.clone(),
                display_name: self.display_name(&row.user_id),
                recipe_id: row.recipe_id.clone(),
            })
            .collect();

        let feedback = self
            .snapshot
            .feedback
            .iter()
            .filter(|row| row.user_id != exclude_user_id)
            .map(|row| PeerFeedback {
                user_id: row.user_id.clone(),
                display_name: self.display_name(&row.user_id),
                recipe_id: row.recipe_id.clone(),
                rating: row.rating,
            })
            .collect();

        Ok(PeerActivity {
            favorites,
            feedback,
        })
    }

    async fn get_candidate_recipes(&self, excluding: &[String]) -> StoreResult<Vec<Recipe>> {
        let excluded: HashSet<&str> = excluding.iter().map(String::as_str).collect();

        let mut recipes: Vec<Recipe> = self
            .snapshot
            .recipes
            .iter()
            .filter(|recipe| !excluded.contains(recipe.id.as_str()))
            .cloned()
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(recipes)
    }

    async fn get_popular_recipes(&self, limit: usize) -> StoreResult<Vec<PopularRecipe>> {
        let mut rating_sums: HashMap<&str, (u32, u32)> = HashMap::new();
        for row in &self.snapshot.feedback {
            let entry = rating_sums.entry(row.recipe_id.as_str()).or_insert((0, 0));
            entry.0 += row.rating as u32;
            entry.1 += 1;
        }

        let mut favorite_counts: HashMap<&str, u32> = HashMap::new();
        for row in &self.snapshot.favorites {
            *favorite_counts.entry(row.recipe_id.as_str()).or_insert(0) += 1;
        }

        let mut popular: Vec<PopularRecipe> = self
            .snapshot
            .recipes
            .iter()
            .map(|recipe| {
                let (sum, count) = rating_sums
                    .get(recipe.id.as_str())
                    .copied()
                    .unwrap_or((0, 0));
                PopularRecipe {
                    recipe: recipe.clone(),
                    average_rating: (count > 0).then(|| sum as f64 / count as f64),
                    rating_count: count,
                    favorite_count: favorite_counts
                        .get(recipe.id.as_str())
                        .copied()
                        .unwrap_or(0),
                }
            })
            .collect();

        popular.sort_by(compare_popularity);
        popular.truncate(limit);

        Ok(popular)
    }
}
