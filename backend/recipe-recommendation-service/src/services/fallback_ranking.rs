//! Popularity ranking for users without any behavioral data
//!
//! Algorithm:
//! - Rated recipes: score = average_rating * ln(1 + rating_count), so a single
//!   5-star rating does not beat a well-reviewed 4.6
//! - Unrated recipes follow, newest first
//! - When nothing in the pool is rated, newest first with a linear rank score
//!
//! Scores are normalized to [0, 1]. This is not personalized; responses built
//! from it are flagged as fallback.

use crate::models::{PopularRecipe, Reason, ReasonKind, RecommendedRecipe};
use crate::services::hybrid_ranker::sort_by_score;
use crate::utils::to_percentage;
use std::cmp::Ordering;
use tracing::debug;

const NEWLY_ADDED_REASON: &str = "Món mới được thêm gần đây";

fn is_rated(entry: &PopularRecipe) -> bool {
    entry.rating_count > 0
        && entry
            .average_rating
            .map_or(false, |avg| avg.is_finite() && avg > 0.0)
}

/// Popularity score of a rated recipe; 0 when unrated
pub fn popularity_score(entry: &PopularRecipe) -> f64 {
    if !is_rated(entry) {
        return 0.0;
    }
    let average = entry.average_rating.unwrap_or(0.0);
    average * (1.0 + entry.rating_count as f64).ln()
}

fn popular_reason(entry: &PopularRecipe) -> Reason {
    Reason::new(
        ReasonKind::Popularity,
        format!(
            "Được cộng đồng đánh giá {:.1}/5 ({} lượt)",
            entry.average_rating.unwrap_or(0.0),
            entry.rating_count
        ),
    )
}

fn newly_added_reason() -> Reason {
    Reason::new(ReasonKind::Popularity, NEWLY_ADDED_REASON)
}

fn to_recommended(entry: PopularRecipe, score: f64, reason: Reason) -> RecommendedRecipe {
    RecommendedRecipe {
        recipe: entry.recipe,
        final_score: score,
        content_score: 0.0,
        collaborative_score: 0.0,
        match_percentage: to_percentage(score),
        reasons: vec![reason.text],
    }
}

/// Newest first, id ascending on equal timestamps
fn sort_newest_first(pool: &mut [PopularRecipe]) {
    pool.sort_by(|a, b| {
        b.recipe
            .created_at
            .cmp(&a.recipe.created_at)
            .then_with(|| a.recipe.id.cmp(&b.recipe.id))
    });
}

/// Global popularity order: rated by score descending, then unrated newest first
///
/// Stores truncate their popularity pool in this order, so any prefix of it
/// holds the top of `rank_popular` over the whole catalog.
pub fn compare_popularity(a: &PopularRecipe, b: &PopularRecipe) -> Ordering {
    match (is_rated(a), is_rated(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => popularity_score(b)
            .partial_cmp(&popularity_score(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.recipe.id.cmp(&b.recipe.id)),
        (false, false) => b
            .recipe
            .created_at
            .cmp(&a.recipe.created_at)
            .then_with(|| a.recipe.id.cmp(&b.recipe.id)),
    }
}

/// Rank a popularity pool into at most `limit` fallback recommendations
pub fn rank_popular(pool: Vec<PopularRecipe>, limit: usize) -> Vec<RecommendedRecipe> {
    let (rated, mut unrated): (Vec<PopularRecipe>, Vec<PopularRecipe>) =
        pool.into_iter().partition(is_rated);
    sort_newest_first(&mut unrated);

    let mut ranked: Vec<RecommendedRecipe> = if rated.is_empty() {
        let total = unrated.len() as f64;
        unrated
            .into_iter()
            .enumerate()
            .map(|(position, entry)| {
                let score = (total - position as f64) / total;
                to_recommended(entry, score, newly_added_reason())
            })
            .collect()
    } else {
        let max_score = rated.iter().map(popularity_score).fold(0.0_f64, f64::max);

        let mut rated: Vec<RecommendedRecipe> = rated
            .into_iter()
            .map(|entry| {
                let score = if max_score > 0.0 {
                    popularity_score(&entry) / max_score
                } else {
                    0.0
                };
                let reason = popular_reason(&entry);
                to_recommended(entry, score, reason)
            })
            .collect();
        sort_by_score(&mut rated);

        rated.extend(unrated.into_iter().map(|entry| {
            to_recommended(entry, 0.0, newly_added_reason())
        }));
        rated
    };

    ranked.truncate(limit);

    debug!(
        returned = ranked.len(),
        top_score = ranked.first().map(|r| r.final_score).unwrap_or(0.0),
        "Popularity fallback ranked"
    );

    ranked
}
