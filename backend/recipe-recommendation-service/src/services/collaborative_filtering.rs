// ============================================
// Collaborative Scorer (user-based)
// ============================================
//
// Recommends recipes rated highly by users whose ratings correlate with the
// current user's.
//
// Data Flow:
//   Peer favorites (implicit 5) + peer feedback (1-5) → Rating Matrix
//   Own ratings × each peer → Pearson correlation → Top similar users
//   Σ(similarity × rating/5) / contributors → max-normalized item score

use crate::models::{
    is_valid_rating, Favorite, Feedback, PeerActivity, Reason, ReasonKind, Recipe, ScoredRecipe,
    FAVORITE_RATING, MAX_RATING,
};
use crate::utils::{short_user_label, to_percentage};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Contributing peers named per item
const MAX_CONTRIBUTORS: usize = 3;

/// recipe_id → rating
pub type RatingVector = HashMap<String, f64>;

/// Sparse peer → (recipe → rating) matrix, built once per request
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    ratings: HashMap<String, RatingVector>,
    display_names: HashMap<String, String>,
}

impl RatingMatrix {
    /// Favorites count as rating 5; feedback overrides a favorite on the same recipe
    pub fn from_peer_activity(activity: &PeerActivity) -> Self {
        let mut matrix = Self::default();

        for favorite in &activity.favorites {
            matrix.remember_name(&favorite.user_id, favorite.display_name.as_deref());
            matrix
                .ratings
                .entry(favorite.user_id.clone())
                .or_default()
                .entry(favorite.recipe_id.clone())
                .or_insert(FAVORITE_RATING as f64);
        }

        for feedback in &activity.feedback {
            matrix.remember_name(&feedback.user_id, feedback.display_name.as_deref());
            if !is_valid_rating(feedback.rating) {
                continue;
            }
            matrix
                .ratings
                .entry(feedback.user_id.clone())
                .or_default()
                .insert(feedback.recipe_id.clone(), feedback.rating as f64);
        }

        matrix
    }

    fn remember_name(&mut self, user_id: &str, name: Option<&str>) {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.display_names
                .entry(user_id.to_string())
                .or_insert_with(|| name.to_string());
        }
    }

    pub fn user_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn ratings_of(&self, user_id: &str) -> Option<&RatingVector> {
        self.ratings.get(user_id)
    }

    pub fn display_name(&self, user_id: &str) -> Option<&str> {
        self.display_names.get(user_id).map(String::as_str)
    }
}

/// The requesting user's own ratings, built the same way as a peer row
pub fn user_ratings(favorites: &[Favorite], feedback: &[Feedback]) -> RatingVector {
    let mut ratings = RatingVector::new();
    for favorite in favorites {
        ratings
            .entry(favorite.recipe.id.clone())
            .or_insert(FAVORITE_RATING as f64);
    }
    for entry in feedback.iter().filter(|f| is_valid_rating(f.rating)) {
        ratings.insert(entry.recipe.id.clone(), entry.rating as f64);
    }
    ratings
}

/// Pearson correlation over the recipes both users rated
///
/// None when fewer than two recipes are shared or either side has no variance.
pub fn pearson(a: &RatingVector, b: &RatingVector) -> Option<f64> {
    let mut common: Vec<&String> = a.keys().filter(|id| b.contains_key(*id)).collect();
    if common.len() <= 1 {
        return None;
    }
    common.sort();

    let n = common.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for id in common {
        let x = a[id];
        let y = b[id];
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    Some((numerator / denominator).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarUser {
    pub user_id: String,
    pub similarity: f64,
}

#[derive(Debug, Clone)]
pub struct CollaborativeConfig {
    pub max_similar_users: usize,
    /// Peers must be strictly above this similarity
    pub min_user_similarity: f64,
}

impl Default for CollaborativeConfig {
    fn default() -> Self {
        Self {
            max_similar_users: 20,
            min_user_similarity: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
struct Contributor {
    label: String,
    named: bool,
    similarity_percent: u8,
}

#[derive(Debug, Default)]
struct ItemAccumulator {
    weighted_sum: f64,
    count: usize,
    contributors: Vec<Contributor>,
}

pub struct CollaborativeScorer {
    config: CollaborativeConfig,
}

impl CollaborativeScorer {
    pub fn new(config: CollaborativeConfig) -> Self {
        Self { config }
    }

    /// Peers correlating above the threshold, most similar first (ties by id)
    pub fn find_similar_users(
        &self,
        own_ratings: &RatingVector,
        matrix: &RatingMatrix,
    ) -> Vec<SimilarUser> {
        let mut similar: Vec<SimilarUser> = matrix
            .ratings
            .iter()
            .filter_map(|(user_id, ratings)| {
                pearson(own_ratings, ratings).map(|similarity| SimilarUser {
                    user_id: user_id.clone(),
                    similarity,
                })
            })
            .filter(|peer| peer.similarity > self.config.min_user_similarity)
            .collect();

        similar.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        similar.truncate(self.config.max_similar_users);
        similar
    }

    /// Score candidate recipes from similar users' ratings
    ///
    /// Recipes the user already rated are skipped. The best-supported candidate
    /// scores exactly 1.0.
    pub fn score(
        &self,
        own_ratings: &RatingVector,
        matrix: &RatingMatrix,
        candidates: &[Recipe],
    ) -> Vec<ScoredRecipe> {
        if own_ratings.is_empty() || matrix.user_count() == 0 {
            return Vec::new();
        }

        let similar_users = self.find_similar_users(own_ratings, matrix);
        if similar_users.is_empty() {
            debug!(
                peers = matrix.user_count(),
                "No similar users above threshold"
            );
            return Vec::new();
        }

        let candidate_ids: HashSet<&str> = candidates.iter().map(|r| r.id.as_str()).collect();
        let mut items: HashMap<&str, ItemAccumulator> = HashMap::new();

        for peer in &similar_users {
            let Some(peer_ratings) = matrix.ratings_of(&peer.user_id) else {
                continue;
            };

            let contributor = Contributor {
                label: matrix
                    .display_name(&peer.user_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| short_user_label(&peer.user_id)),
                named: matrix.display_name(&peer.user_id).is_some(),
                similarity_percent: to_percentage(peer.similarity),
            };

            for (recipe_id, rating) in peer_ratings {
                if own_ratings.contains_key(recipe_id)
                    || !candidate_ids.contains(recipe_id.as_str())
                {
                    continue;
                }

                let entry = items.entry(recipe_id.as_str()).or_default();
                entry.weighted_sum += peer.similarity * rating / MAX_RATING as f64;
                entry.count += 1;
                if entry.contributors.len() < MAX_CONTRIBUTORS {
                    entry.contributors.push(contributor.clone());
                }
            }
        }

        let averages: HashMap<&str, f64> = items
            .iter()
            .map(|(id, acc)| (*id, acc.weighted_sum / acc.count as f64))
            .collect();
        let max_score = averages.values().copied().fold(0.0_f64, f64::max);
        if max_score <= 0.0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredRecipe> = candidates
            .iter()
            .filter_map(|recipe| {
                let acc = items.get(recipe.id.as_str())?;
                let average = averages.get(recipe.id.as_str())?;
                Some(ScoredRecipe {
                    recipe: recipe.clone(),
                    score: average / max_score,
                    reasons: vec![Reason::new(
                        ReasonKind::Collaborative,
                        contributor_reason(&acc.contributors, acc.count),
                    )],
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.recipe.id.cmp(&b.recipe.id))
        });

        debug!(
            similar_users = similar_users.len(),
            scored = scored.len(),
            "Collaborative scoring completed"
        );

        scored
    }
}

fn contributor_reason(contributors: &[Contributor], total: usize) -> String {
    if !contributors.iter().any(|c| c.named) {
        return format!(
            "{} người dùng có khẩu vị giống bạn đã thích món này",
            total
        );
    }

    match contributors {
        [only] if total == 1 => format!(
            "{} (giống bạn {}%) đã thích món này",
            only.label, only.similarity_percent
        ),
        [first, second, ..] if total > 2 => format!(
            "{} và {} cùng {} người khác có khẩu vị giống bạn đã thích món này",
            first.label,
            second.label,
            total - 2
        ),
        [first, second, ..] => format!(
            "{} và {} có khẩu vị giống bạn đã thích món này",
            first.label, second.label
        ),
        [only] => format!(
            "{} cùng {} người khác có khẩu vị giống bạn đã thích món này",
            only.label,
            total - 1
        ),
        [] => format!(
            "{} người dùng có khẩu vị giống bạn đã thích món này",
            total
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeerFavorite, PeerFeedback};
    use chrono::Utc;

    fn ratings(pairs: &[(&str, f64)]) -> RatingVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn recipe(id: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            category: None,
            difficulty: None,
            cooking_time: None,
            ingredients: vec![],
            created_at: Utc::now(),
        }
    }

    fn peer_feedback(user: &str, name: Option<&str>, recipe_id: &str, rating: u8) -> PeerFeedback {
        PeerFeedback {
            user_id: user.to_string(),
            display_name: name.map(str::to_string),
            recipe_id: recipe_id.to_string(),
            rating,
        }
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let a = ratings(&[("x", 5.0), ("y", 1.0)]);
        let b = ratings(&[("x", 5.0), ("y", 1.0), ("z", 5.0)]);
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_symmetric() {
        let a = ratings(&[("x", 4.0), ("y", 2.0), ("z", 5.0), ("w", 1.0)]);
        let b = ratings(&[("x", 3.0), ("y", 3.0), ("z", 4.0), ("v", 2.0)]);
        assert_eq!(pearson(&a, &b), pearson(&b, &a));

        let inverse = ratings(&[("x", 1.0), ("y", 5.0)]);
        let forward = ratings(&[("x", 5.0), ("y", 1.0)]);
        assert!((pearson(&forward, &inverse).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        let a = ratings(&[("x", 5.0)]);
        let b = ratings(&[("x", 5.0), ("y", 3.0)]);
        assert_eq!(pearson(&a, &b), None);

        // all-favorite rows have no variance
        let flat = ratings(&[("x", 5.0), ("y", 5.0)]);
        assert_eq!(pearson(&flat, &b), None);
    }

    #[test]
    fn test_feedback_overrides_favorite_in_matrix() {
        let activity = PeerActivity {
            favorites: vec![PeerFavorite {
                user_id: "p1".to_string(),
                display_name: Some("Lan".to_string()),
                recipe_id: "x".to_string(),
            }],
            feedback: vec![peer_feedback("p1", None, "x", 2)],
        };

        let matrix = RatingMatrix::from_peer_activity(&activity);
        assert_eq!(matrix.ratings_of("p1").unwrap()["x"], 2.0);
        assert_eq!(matrix.display_name("p1"), Some("Lan"));
    }

    #[test]
    fn test_own_feedback_overrides_own_favorite() {
        let favorites = vec![
            Favorite {
                user_id: "u1".to_string(),
                recipe: recipe("x"),
                created_at: Utc::now(),
            },
            Favorite {
                user_id: "u1".to_string(),
                recipe: recipe("y"),
                created_at: Utc::now(),
            },
        ];
        let feedback = vec![Feedback {
            user_id: "u1".to_string(),
            recipe: recipe("x"),
            rating: 2,
            created_at: Utc::now(),
        }];

        let own = user_ratings(&favorites, &feedback);
        assert_eq!(own["x"], 2.0);
        assert_eq!(own["y"], FAVORITE_RATING as f64);
        assert_eq!(own.len(), 2);
    }

    #[test]
    fn test_similar_users_threshold_and_order() {
        let own = ratings(&[("x", 5.0), ("y", 1.0), ("w", 3.0)]);
        let activity = PeerActivity {
            favorites: vec![],
            feedback: vec![
                peer_feedback("b", None, "x", 5),
                peer_feedback("b", None, "y", 1),
                peer_feedback("a", None, "x", 5),
                peer_feedback("a", None, "y", 1),
                peer_feedback("c", None, "x", 1),
                peer_feedback("c", None, "y", 5),
            ],
        };
        let matrix = RatingMatrix::from_peer_activity(&activity);

        let similar = CollaborativeScorer::new(CollaborativeConfig::default())
            .find_similar_users(&own, &matrix);

        let ids: Vec<&str> = similar.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_similar_users_truncated() {
        let own = ratings(&[("x", 5.0), ("y", 1.0)]);
        let feedback = (0..30)
            .flat_map(|i| {
                let user = format!("peer{:02}", i);
                vec![
                    peer_feedback(&user, None, "x", 5),
                    peer_feedback(&user, None, "y", 1),
                ]
            })
            .collect();
        let matrix = RatingMatrix::from_peer_activity(&PeerActivity {
            favorites: vec![],
            feedback,
        });

        let similar = CollaborativeScorer::new(CollaborativeConfig::default())
            .find_similar_users(&own, &matrix);
        assert_eq!(similar.len(), 20);
        assert_eq!(similar[0].user_id, "peer00");
    }

    #[test]
    fn test_score_normalized_to_best_item() {
        let own = ratings(&[("x", 5.0), ("y", 1.0)]);
        let activity = PeerActivity {
            favorites: vec![],
            feedback: vec![
                peer_feedback("p1", Some("Lan"), "x", 5),
                peer_feedback("p1", Some("Lan"), "y", 1),
                peer_feedback("p1", Some("Lan"), "z", 5),
                peer_feedback("p1", Some("Lan"), "q", 2),
                peer_feedback("p2", None, "x", 5),
                peer_feedback("p2", None, "y", 1),
                peer_feedback("p2", None, "z", 5),
            ],
        };
        let matrix = RatingMatrix::from_peer_activity(&activity);
        let candidates = vec![recipe("q"), recipe("x"), recipe("z")];

        let scored = CollaborativeScorer::new(CollaborativeConfig::default())
            .score(&own, &matrix, &candidates);

        let ids: Vec<&str> = scored.iter().map(|s| s.recipe.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "q"]);
        assert_eq!(scored[0].score, 1.0);
        assert!((scored[1].score - 0.4).abs() < 1e-9);
        assert_eq!(
            scored[0].reasons[0].text,
            "Lan và #p2 có khẩu vị giống bạn đã thích món này"
        );
        assert_eq!(
            scored[1].reasons[0].text,
            "Lan (giống bạn 100%) đã thích món này"
        );
    }

    #[test]
    fn test_non_candidates_ignored() {
        let own = ratings(&[("x", 5.0), ("y", 1.0)]);
        let activity = PeerActivity {
            favorites: vec![],
            feedback: vec![
                peer_feedback("p1", None, "x", 5),
                peer_feedback("p1", None, "y", 1),
                peer_feedback("p1", None, "gone", 5),
            ],
        };
        let matrix = RatingMatrix::from_peer_activity(&activity);

        let scored = CollaborativeScorer::new(CollaborativeConfig::default()).score(
            &own,
            &matrix,
            &[recipe("other")],
        );
        assert!(scored.is_empty());
    }

    #[test]
    fn test_reason_phrasing_scales() {
        let named = |label: &str| Contributor {
            label: label.to_string(),
            named: true,
            similarity_percent: 80,
        };
        let anonymous = Contributor {
            label: "#ab12".to_string(),
            named: false,
            similarity_percent: 60,
        };

        assert_eq!(
            contributor_reason(&[named("Lan")], 1),
            "Lan (giống bạn 80%) đã thích món này"
        );
        assert_eq!(
            contributor_reason(&[named("Lan"), named("Minh"), named("Hoa")], 5),
            "Lan và Minh cùng 3 người khác có khẩu vị giống bạn đã thích món này"
        );
        assert_eq!(
            contributor_reason(&[anonymous.clone(), anonymous], 4),
            "4 người dùng có khẩu vị giống bạn đã thích món này"
        );
    }
}
