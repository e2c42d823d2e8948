// ============================================
// Preference Profiler
// ============================================
//
// Reduces a user's favorites, view history and feedback into one weighted
// preference summary.
//
// Signal weights:
// - Favorite: category/difficulty +1, each ingredient +1, cooking time weight 1
// - View: view frequency +1 for its category, each ingredient +0.5, cooking time weight 0.5
// - Feedback: each ingredient +rating/5, cooking time weight rating/5
//
// Category and difficulty weights are divided by the favorite count, view
// frequency by the view count. Ingredient weights stay raw.

use crate::models::{
    is_valid_rating, Difficulty, Favorite, Feedback, Recipe, RecipeCategory, RecipeView, MAX_RATING,
};
use crate::services::ingredient_similarity::normalize_ingredient;
use crate::utils::cooking_minutes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Average cooking time assumed when no recipe carries a usable duration
pub const DEFAULT_COOKING_MINUTES: f64 = 30.0;

const FAVORITE_WEIGHT: f64 = 1.0;
const VIEW_WEIGHT: f64 = 0.5;

/// Weighted summary of a user's inferred tastes, built fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    pub favorite_categories: HashMap<RecipeCategory, f64>,
    pub favorite_difficulties: HashMap<Difficulty, f64>,
    /// Normalized ingredient → raw accumulated weight
    pub favorite_ingredients: HashMap<String, f64>,
    pub average_cooking_minutes: f64,
    pub view_frequency: HashMap<RecipeCategory, f64>,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            favorite_categories: HashMap::new(),
            favorite_difficulties: HashMap::new(),
            favorite_ingredients: HashMap::new(),
            average_cooking_minutes: DEFAULT_COOKING_MINUTES,
            view_frequency: HashMap::new(),
        }
    }
}

impl PreferenceProfile {
    pub fn category_affinity(&self, category: Option<RecipeCategory>) -> f64 {
        category
            .and_then(|c| self.favorite_categories.get(&c).copied())
            .unwrap_or(0.0)
    }

    pub fn difficulty_affinity(&self, difficulty: Option<Difficulty>) -> f64 {
        difficulty
            .and_then(|d| self.favorite_difficulties.get(&d).copied())
            .unwrap_or(0.0)
    }

    pub fn view_affinity(&self, category: Option<RecipeCategory>) -> f64 {
        category
            .and_then(|c| self.view_frequency.get(&c).copied())
            .unwrap_or(0.0)
    }
}

/// Running weighted average of cooking durations
#[derive(Debug, Default)]
struct CookingTimeAccumulator {
    weighted_minutes: f64,
    total_weight: f64,
}

impl CookingTimeAccumulator {
    fn add(&mut self, recipe: &Recipe, weight: f64) {
        match cooking_minutes(recipe) {
            Ok(minutes) => {
                self.weighted_minutes += minutes * weight;
                self.total_weight += weight;
            }
            Err(e) => {
                debug!(error = %e, "Cooking time skipped for profile");
            }
        }
    }

    fn average(&self) -> f64 {
        if self.total_weight > 0.0 {
            self.weighted_minutes / self.total_weight
        } else {
            DEFAULT_COOKING_MINUTES
        }
    }
}

fn add_ingredients(target: &mut HashMap<String, f64>, recipe: &Recipe, weight: f64) {
    for raw in &recipe.ingredients {
        let normalized = normalize_ingredient(raw);
        if normalized.is_empty() {
            continue;
        }
        *target.entry(normalized).or_insert(0.0) += weight;
    }
}

fn normalize_by<K>(map: &mut HashMap<K, f64>, count: usize) {
    if count == 0 {
        return;
    }
    for value in map.values_mut() {
        *value /= count as f64;
    }
}

/// Build the preference profile from the user's three behavioral sources
///
/// Missing attributes on individual recipes contribute nothing for that
/// attribute; nothing here fails.
pub fn build_profile(
    favorites: &[Favorite],
    views: &[RecipeView],
    feedback: &[Feedback],
) -> PreferenceProfile {
    let mut profile = PreferenceProfile::default();
    let mut cooking_time = CookingTimeAccumulator::default();

    for favorite in favorites {
        let recipe = &favorite.recipe;
        if let Some(category) = recipe.category {
            *profile.favorite_categories.entry(category).or_insert(0.0) += 1.0;
        }
        if let Some(difficulty) = recipe.difficulty {
            *profile.favorite_difficulties.entry(difficulty).or_insert(0.0) += 1.0;
        }
        add_ingredients(&mut profile.favorite_ingredients, recipe, FAVORITE_WEIGHT);
        cooking_time.add(recipe, FAVORITE_WEIGHT);
    }

    for view in views {
        let recipe = &view.recipe;
        if let Some(category) = recipe.category {
            *profile.view_frequency.entry(category).or_insert(0.0) += 1.0;
        }
        add_ingredients(&mut profile.favorite_ingredients, recipe, VIEW_WEIGHT);
        cooking_time.add(recipe, VIEW_WEIGHT);
    }

    for entry in feedback {
        if !is_valid_rating(entry.rating) {
            debug!(
                recipe_id = %entry.recipe.id,
                rating = entry.rating,
                "Feedback with out-of-range rating ignored"
            );
            continue;
        }
        let weight = entry.rating as f64 / MAX_RATING as f64;
        add_ingredients(&mut profile.favorite_ingredients, &entry.recipe, weight);
        cooking_time.add(&entry.recipe, weight);
    }

    normalize_by(&mut profile.favorite_categories, favorites.len());
    normalize_by(&mut profile.favorite_difficulties, favorites.len());
    normalize_by(&mut profile.view_frequency, views.len());
    profile.average_cooking_minutes = cooking_time.average();

    debug!(
        favorites = favorites.len(),
        views = views.len(),
        feedback = feedback.len(),
        ingredients = profile.favorite_ingredients.len(),
        average_cooking_minutes = profile.average_cooking_minutes,
        "Preference profile built"
    );

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CookingTime;
    use chrono::Utc;

    fn recipe(
        id: &str,
        category: Option<RecipeCategory>,
        difficulty: Option<Difficulty>,
        time: Option<CookingTime>,
        ingredients: &[&str],
    ) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            category,
            difficulty,
            cooking_time: time,
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn favorite(recipe: Recipe) -> Favorite {
        Favorite {
            user_id: "u1".to_string(),
            recipe,
            created_at: Utc::now(),
        }
    }

    fn view(recipe: Recipe) -> RecipeView {
        RecipeView {
            user_id: "u1".to_string(),
            recipe,
            viewed_at: Utc::now(),
            duration_seconds: Some(30),
            source: None,
        }
    }

    fn feedback(recipe: Recipe, rating: u8) -> Feedback {
        Feedback {
            user_id: "u1".to_string(),
            recipe,
            rating,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_profile_defaults() {
        let profile = build_profile(&[], &[], &[]);
        assert!(profile.favorite_categories.is_empty());
        assert!(profile.favorite_ingredients.is_empty());
        assert_eq!(profile.average_cooking_minutes, DEFAULT_COOKING_MINUTES);
    }

    #[test]
    fn test_favorite_distributions_sum_to_one() {
        let favorites = vec![
            favorite(recipe("a", Some(RecipeCategory::MainDish), Some(Difficulty::Easy), None, &[])),
            favorite(recipe("b", Some(RecipeCategory::MainDish), Some(Difficulty::Hard), None, &[])),
            favorite(recipe("c", Some(RecipeCategory::Dessert), Some(Difficulty::Easy), None, &[])),
            favorite(recipe("d", Some(RecipeCategory::Snack), Some(Difficulty::Easy), None, &[])),
        ];

        let profile = build_profile(&favorites, &[], &[]);

        let category_sum: f64 = profile.favorite_categories.values().sum();
        let difficulty_sum: f64 = profile.favorite_difficulties.values().sum();
        assert!((category_sum - 1.0).abs() < 1e-9);
        assert!((difficulty_sum - 1.0).abs() < 1e-9);
        assert_eq!(profile.favorite_categories[&RecipeCategory::MainDish], 0.5);
        assert_eq!(profile.favorite_difficulties[&Difficulty::Easy], 0.75);
    }

    #[test]
    fn test_ingredient_weights_accumulate_unnormalized() {
        let favorites = vec![
            favorite(recipe("a", None, None, None, &["300g thịt bò", "hành tây"])),
            favorite(recipe("b", None, None, None, &["Thịt bò"])),
        ];
        let views = vec![view(recipe("c", None, None, None, &["thịt bò"]))];
        let rated = vec![feedback(recipe("d", None, None, None, &["hành tây"]), 4)];

        let profile = build_profile(&favorites, &views, &rated);

        assert!((profile.favorite_ingredients["thịt bò"] - 2.5).abs() < 1e-9);
        assert!((profile.favorite_ingredients["hành tây"] - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_view_frequency_normalized_by_view_count() {
        let views = vec![
            view(recipe("a", Some(RecipeCategory::Beverage), None, None, &[])),
            view(recipe("b", Some(RecipeCategory::Beverage), None, None, &[])),
            view(recipe("c", None, None, None, &[])),
            view(recipe("d", Some(RecipeCategory::Snack), None, None, &[])),
        ];

        let profile = build_profile(&[], &views, &[]);

        assert_eq!(profile.view_frequency[&RecipeCategory::Beverage], 0.5);
        assert_eq!(profile.view_frequency[&RecipeCategory::Snack], 0.25);
        assert!(profile.favorite_categories.is_empty());
    }

    #[test]
    fn test_feedback_does_not_touch_categories() {
        let rated = vec![feedback(
            recipe("a", Some(RecipeCategory::MainDish), Some(Difficulty::Easy), None, &[]),
            1,
        )];

        let profile = build_profile(&[], &[], &rated);

        assert!(profile.favorite_categories.is_empty());
        assert!(profile.favorite_difficulties.is_empty());
    }

    #[test]
    fn test_weighted_cooking_time_average() {
        let favorites = vec![favorite(recipe("a", None, None, Some("1 giờ".into()), &[]))];
        let views = vec![view(recipe("b", None, None, Some(CookingTime::Minutes(30)), &[]))];
        let rated = vec![
            feedback(recipe("c", None, None, Some("rất nhanh".into()), &[]), 5),
            feedback(recipe("d", None, None, None, &[]), 5),
        ];

        let profile = build_profile(&favorites, &views, &rated);

        // (60×1 + 30×0.5) / 1.5; unparseable and missing durations carry no weight
        assert!((profile.average_cooking_minutes - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_rating_ignored() {
        let rated = vec![feedback(recipe("a", None, None, None, &["tỏi"]), 0)];
        let profile = build_profile(&[], &[], &rated);
        assert!(profile.favorite_ingredients.is_empty());
    }

    #[test]
    fn test_affinity_lookups() {
        let favorites = vec![favorite(recipe(
            "a",
            Some(RecipeCategory::SideDish),
            Some(Difficulty::Medium),
            None,
            &[],
        ))];
        let profile = build_profile(&favorites, &[], &[]);

        assert_eq!(profile.category_affinity(Some(RecipeCategory::SideDish)), 1.0);
        assert_eq!(profile.category_affinity(Some(RecipeCategory::Dessert)), 0.0);
        assert_eq!(profile.category_affinity(None), 0.0);
        assert_eq!(profile.difficulty_affinity(Some(Difficulty::Medium)), 1.0);
        assert_eq!(profile.view_affinity(Some(RecipeCategory::SideDish)), 0.0);
    }
}
