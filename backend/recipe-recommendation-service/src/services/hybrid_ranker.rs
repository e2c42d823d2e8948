// ============================================
// Fusion & Ranker
// ============================================
//
// final_score = content × w_content + collaborative × w_collaborative
//
// Recipes present in only one signal get 0 for the other. Reasons are
// ordered by kind priority, stable within a kind.

use crate::models::{BlendWeights, Reason, RecommendedRecipe, Recipe, ScoredRecipe};
use crate::utils::to_percentage;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

struct FusedCandidate {
    recipe: Recipe,
    content_score: f64,
    collaborative_score: f64,
    reasons: Vec<Reason>,
}

/// Merge both signals, rank by final score and keep the top `limit`
pub fn fuse(
    content: Vec<ScoredRecipe>,
    collaborative: Vec<ScoredRecipe>,
    weights: &BlendWeights,
    limit: usize,
) -> Vec<RecommendedRecipe> {
    let mut merged: HashMap<String, FusedCandidate> = HashMap::new();

    for scored in content {
        merged.insert(
            scored.recipe.id.clone(),
            FusedCandidate {
                recipe: scored.recipe,
                content_score: scored.score,
                collaborative_score: 0.0,
                reasons: scored.reasons,
            },
        );
    }

    for scored in collaborative {
        match merged.get_mut(&scored.recipe.id) {
            Some(existing) => {
                existing.collaborative_score = scored.score;
                existing.reasons.extend(scored.reasons);
            }
            None => {
                merged.insert(
                    scored.recipe.id.clone(),
                    FusedCandidate {
                        recipe: scored.recipe,
                        content_score: 0.0,
                        collaborative_score: scored.score,
                        reasons: scored.reasons,
                    },
                );
            }
        }
    }

    let merged_count = merged.len();
    let mut ranked: Vec<RecommendedRecipe> = merged
        .into_values()
        .map(|mut candidate| {
            let final_score = candidate.content_score * weights.content
                + candidate.collaborative_score * weights.collaborative;
            candidate.reasons.sort_by_key(|r| r.kind.priority());

            RecommendedRecipe {
                recipe: candidate.recipe,
                final_score,
                content_score: candidate.content_score,
                collaborative_score: candidate.collaborative_score,
                match_percentage: to_percentage(final_score),
                reasons: candidate.reasons.into_iter().map(|r| r.text).collect(),
            }
        })
        .collect();

    sort_by_score(&mut ranked);
    ranked.truncate(limit);

    debug!(
        merged = merged_count,
        returned = ranked.len(),
        content_weight = weights.content,
        collaborative_weight = weights.collaborative,
        "Fused recommendation scores"
    );

    ranked
}

/// Final score descending, recipe id ascending on ties
pub fn sort_by_score(items: &mut [RecommendedRecipe]) {
    items.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.recipe.id.cmp(&b.recipe.id))
    });
}
