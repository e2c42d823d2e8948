use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipe categories used by the catalog (`monchinh`, `monphu`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecipeCategory {
    #[serde(rename = "monchinh", alias = "main")]
    MainDish,
    #[serde(rename = "monphu", alias = "side")]
    SideDish,
    #[serde(rename = "trangmieng", alias = "dessert")]
    Dessert,
    #[serde(rename = "douong", alias = "beverage")]
    Beverage,
    #[serde(rename = "anvat", alias = "snack")]
    Snack,
}

impl RecipeCategory {
    pub const ALL: [RecipeCategory; 5] = [
        RecipeCategory::MainDish,
        RecipeCategory::SideDish,
        RecipeCategory::Dessert,
        RecipeCategory::Beverage,
        RecipeCategory::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeCategory::MainDish => "monchinh",
            RecipeCategory::SideDish => "monphu",
            RecipeCategory::Dessert => "trangmieng",
            RecipeCategory::Beverage => "douong",
            RecipeCategory::Snack => "anvat",
        }
    }

    /// Human-readable label used in reason strings
    pub fn label(&self) -> &'static str {
        match self {
            RecipeCategory::MainDish => "món chính",
            RecipeCategory::SideDish => "món phụ",
            RecipeCategory::Dessert => "tráng miệng",
            RecipeCategory::Beverage => "đồ uống",
            RecipeCategory::Snack => "ăn vặt",
        }
    }
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "de", alias = "easy")]
    Easy,
    #[serde(rename = "trungbinh", alias = "medium")]
    Medium,
    #[serde(rename = "kho", alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "dễ",
            Difficulty::Medium => "trung bình",
            Difficulty::Hard => "khó",
        }
    }
}

/// Cooking time as stored in the catalog: free text ("1 giờ 30 phút") or plain minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CookingTime {
    Minutes(u32),
    Text(String),
}

impl From<&str> for CookingTime {
    fn from(text: &str) -> Self {
        CookingTime::Text(text.to_string())
    }
}

impl From<u32> for CookingTime {
    fn from(minutes: u32) -> Self {
        CookingTime::Minutes(minutes)
    }
}

impl fmt::Display for CookingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookingTime::Minutes(m) => write!(f, "{} phút", m),
            CookingTime::Text(text) => f.write_str(text.trim()),
        }
    }
}

/// Catalog recipe; immutable for the duration of one recommendation computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<RecipeCategory>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub cooking_time: Option<CookingTime>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A recipe the user marked as favorite (implicit rating 5)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: String,
    pub recipe: Recipe,
    pub created_at: DateTime<Utc>,
}

/// Passive view of a recipe page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub user_id: String,
    pub recipe: Recipe,
    pub viewed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Explicit 1-5 rating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub user_id: String,
    pub recipe: Recipe,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
/// Rating implied by a favorite
pub const FAVORITE_RATING: u8 = MAX_RATING;

pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Another user's favorite, as seen by the collaborative path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerFavorite {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub recipe_id: String,
}

/// Another user's explicit rating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerFeedback {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub recipe_id: String,
    pub rating: u8,
}

/// Favorites and feedback of every user except the requester
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerActivity {
    pub favorites: Vec<PeerFavorite>,
    pub feedback: Vec<PeerFeedback>,
}

impl PeerActivity {
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.feedback.is_empty()
    }
}

/// Row returned by the popularity query used on the cold-start path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularRecipe {
    pub recipe: Recipe,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub favorite_count: u32,
}

/// Content/collaborative blend actually applied to a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendWeights {
    pub content: f64,
    pub collaborative: f64,
    /// Volume/quality indicator of the user's behavioral data in [0, 1]
    pub data_quality: f64,
}

/// Signal that produced a reason; drives the order reasons are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Ingredient,
    Collaborative,
    Category,
    Difficulty,
    CookingTime,
    ViewHistory,
    Popularity,
}

impl ReasonKind {
    /// Lower is shown first
    pub fn priority(&self) -> u8 {
        match self {
            ReasonKind::Ingredient => 0,
            ReasonKind::Collaborative => 1,
            ReasonKind::Category => 2,
            ReasonKind::Difficulty => 3,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub kind: ReasonKind,
    pub text: String,
}

impl Reason {
    pub fn new(kind: ReasonKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One signal's score for a recipe, before fusion
#[derive(Debug, Clone)]
pub struct ScoredRecipe {
    pub recipe: Recipe,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedRecipe {
    pub recipe: Recipe,
    pub final_score: f64,
    pub content_score: f64,
    pub collaborative_score: f64,
    pub match_percentage: u8,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub items: Vec<RecommendedRecipe>,
    /// True when the list is the non-personalized popularity fallback
    pub is_fallback: bool,
    pub weights_used: BlendWeights,
}

impl RecommendationResponse {
    pub fn empty(weights_used: BlendWeights) -> Self {
        Self {
            items: Vec::new(),
            is_fallback: false,
            weights_used,
        }
    }

    pub fn recipe_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.recipe.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_deserializes_catalog_shape() {
        let json = r#"{
            "id": "r1",
            "name": "Bò lúc lắc",
            "category": "monchinh",
            "difficulty": "trungbinh",
            "cookingTime": "1 giờ 30 phút",
            "ingredients": ["300g thịt bò", "1 củ hành tây"],
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.category, Some(RecipeCategory::MainDish));
        assert_eq!(recipe.difficulty, Some(Difficulty::Medium));
        assert_eq!(
            recipe.cooking_time,
            Some(CookingTime::Text("1 giờ 30 phút".to_string()))
        );
        assert_eq!(recipe.ingredients.len(), 2);
    }

    #[test]
    fn test_recipe_tolerates_missing_attributes() {
        let json = r#"{"id": "r2", "cookingTime": 45, "createdAt": "2024-05-01T10:00:00Z"}"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.category, None);
        assert_eq!(recipe.difficulty, None);
        assert_eq!(recipe.cooking_time, Some(CookingTime::Minutes(45)));
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn test_reason_priority_order() {
        assert!(ReasonKind::Ingredient.priority() < ReasonKind::Collaborative.priority());
        assert!(ReasonKind::Collaborative.priority() < ReasonKind::Category.priority());
        assert!(ReasonKind::Category.priority() < ReasonKind::Difficulty.priority());
        assert_eq!(
            ReasonKind::CookingTime.priority(),
            ReasonKind::Popularity.priority()
        );
        assert!(ReasonKind::Difficulty.priority() < ReasonKind::ViewHistory.priority());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
    }
}
