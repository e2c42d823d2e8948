// ============================================
// Content-Based Scorer
// ============================================
//
// Scores catalog recipes against the user's preference profile.
//
// score = 0.40 × ingredient similarity
//       + 0.20 × category affinity
//       + 0.15 × difficulty affinity
//       + 0.15 × cooking time closeness
//       + 0.10 × view frequency
//
// Each signal above the materiality threshold contributes one reason.

use crate::models::{Reason, ReasonKind, Recipe, ScoredRecipe};
use crate::services::ingredient_similarity::{find_most_similar_favorite, IngredientIndex};
use crate::services::profile_builder::PreferenceProfile;
use crate::utils::{cooking_minutes, duration_similarity};
use std::collections::HashSet;
use tracing::debug;

/// Signals below this are too weak to justify a reason
const MATERIALITY_THRESHOLD: f64 = 0.1;
/// Cooking time closeness needed before it is mentioned
const COOKING_TIME_REASON_THRESHOLD: f64 = 0.7;
const MAX_LISTED_INGREDIENTS: usize = 3;

/// Fixed weights of the content signals
#[derive(Debug, Clone)]
pub struct ContentWeights {
    pub ingredient: f64,
    pub category: f64,
    pub difficulty: f64,
    pub cooking_time: f64,
    pub view_frequency: f64,
}

impl Default for ContentWeights {
    fn default() -> Self {
        Self {
            ingredient: 0.40,
            category: 0.20,
            difficulty: 0.15,
            cooking_time: 0.15,
            view_frequency: 0.10,
        }
    }
}

pub struct ContentScorer {
    weights: ContentWeights,
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentScorer {
    pub fn new() -> Self {
        Self {
            weights: ContentWeights::default(),
        }
    }

    pub fn with_weights(weights: ContentWeights) -> Self {
        Self { weights }
    }

    /// Score every candidate the user has not favorited
    ///
    /// `favorites` are the user's favorited recipes; they are excluded from the
    /// output and used to explain ingredient matches. Zero scores are dropped.
    pub fn score(
        &self,
        profile: &PreferenceProfile,
        favorites: &[Recipe],
        candidates: &[Recipe],
    ) -> Vec<ScoredRecipe> {
        let favorite_ids: HashSet<&str> = favorites.iter().map(|r| r.id.as_str()).collect();
        let index = IngredientIndex::new(&profile.favorite_ingredients);

        let scored: Vec<ScoredRecipe> = candidates
            .iter()
            .filter(|recipe| !favorite_ids.contains(recipe.id.as_str()))
            .filter_map(|recipe| self.score_recipe(profile, &index, favorites, recipe))
            .collect();

        debug!(
            candidates = candidates.len(),
            scored = scored.len(),
            "Content scoring completed"
        );

        scored
    }

    fn score_recipe(
        &self,
        profile: &PreferenceProfile,
        index: &IngredientIndex,
        favorites: &[Recipe],
        recipe: &Recipe,
    ) -> Option<ScoredRecipe> {
        let mut reasons = Vec::new();

        // Ingredients
        let ingredient_match = index.score(&recipe.ingredients);
        if let Some(text) = ingredient_reason(
            recipe,
            ingredient_match.similarity,
            &ingredient_match.common_ingredients,
            favorites,
        ) {
            reasons.push(Reason::new(ReasonKind::Ingredient, text));
        }

        // Category
        let category_affinity = profile.category_affinity(recipe.category);
        if let Some(category) = recipe.category {
            if category_affinity >= MATERIALITY_THRESHOLD {
                reasons.push(Reason::new(
                    ReasonKind::Category,
                    format!("Thuộc nhóm {} mà bạn hay yêu thích", category.label()),
                ));
            }
        }

        // Difficulty
        let difficulty_affinity = profile.difficulty_affinity(recipe.difficulty);
        if let Some(difficulty) = recipe.difficulty {
            if difficulty_affinity >= MATERIALITY_THRESHOLD {
                reasons.push(Reason::new(
                    ReasonKind::Difficulty,
                    format!("Độ khó {} phù hợp với bạn", difficulty.label()),
                ));
            }
        }

        // Cooking time
        let cooking_time_similarity = match cooking_minutes(recipe) {
            Ok(minutes) => {
                let similarity = duration_similarity(minutes, profile.average_cooking_minutes);
                if similarity >= COOKING_TIME_REASON_THRESHOLD {
                    reasons.push(Reason::new(
                        ReasonKind::CookingTime,
                        format!(
                            "Thời gian nấu khoảng {} phút, hợp với thói quen của bạn",
                            minutes.round()
                        ),
                    ));
                }
                similarity
            }
            Err(e) => {
                debug!(error = %e, "Cooking time signal skipped");
                0.0
            }
        };

        // View history
        let view_affinity = profile.view_affinity(recipe.category);
        if let Some(category) = recipe.category {
            if view_affinity >= MATERIALITY_THRESHOLD {
                reasons.push(Reason::new(
                    ReasonKind::ViewHistory,
                    format!("Bạn thường xem các món {}", category.label()),
                ));
            }
        }

        let score = ingredient_match.similarity * self.weights.ingredient
            + category_affinity * self.weights.category
            + difficulty_affinity * self.weights.difficulty
            + cooking_time_similarity * self.weights.cooking_time
            + view_affinity * self.weights.view_frequency;

        if score == 0.0 {
            return None;
        }

        Some(ScoredRecipe {
            recipe: recipe.clone(),
            score,
            reasons,
        })
    }
}

fn ingredient_reason(
    recipe: &Recipe,
    similarity: f64,
    common_ingredients: &[String],
    favorites: &[Recipe],
) -> Option<String> {
    if similarity <= 0.0 {
        return None;
    }

    if let Some(similar) = find_most_similar_favorite(recipe, common_ingredients, favorites) {
        return Some(format!(
            "Giống món \"{}\" bạn đã yêu thích ({} nguyên liệu chung)",
            similar.name, similar.shared_ingredients
        ));
    }

    if !common_ingredients.is_empty() {
        let listed: Vec<&str> = common_ingredients
            .iter()
            .take(MAX_LISTED_INGREDIENTS)
            .map(String::as_str)
            .collect();
        return Some(format!("Có nguyên liệu bạn thích: {}", listed.join(", ")));
    }

    if similarity >= MATERIALITY_THRESHOLD {
        return Some("Nguyên liệu hợp với khẩu vị của bạn".to_string());
    }

    None
}
