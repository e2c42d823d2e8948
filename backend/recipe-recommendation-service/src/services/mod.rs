pub mod collaborative_filtering;
pub mod content_based;
pub mod dynamic_weights;
pub mod fallback_ranking;
pub mod hybrid_ranker;
pub mod ingredient_similarity;
pub mod profile_builder;
pub mod recommendation;

pub use collaborative_filtering::{CollaborativeScorer, RatingMatrix};
pub use content_based::ContentScorer;
pub use profile_builder::PreferenceProfile;
pub use recommendation::{CategoryRecommendations, RecommendationEngine};
