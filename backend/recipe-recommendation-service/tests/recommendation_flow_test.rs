use chrono::{DateTime, Duration};
use recipe_recommendation_service::config::RecommendationConfig;
use recipe_recommendation_service::models::{CookingTime, Difficulty, Recipe, RecipeCategory};
use recipe_recommendation_service::services::fallback_ranking::rank_popular;
use recipe_recommendation_service::{
    RecommendationEngine, RecommendationError, RecommendationStore, Snapshot, SnapshotStore,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("recipe_recommendation_service=debug")
        .with_test_writer()
        .try_init();
}

fn recipe(
    id: &str,
    name: &str,
    category: RecipeCategory,
    minutes: u32,
    ingredients: &[&str],
    age_days: i64,
) -> Recipe {
    let base = DateTime::from_timestamp(1_717_200_000, 0).unwrap();
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        category: Some(category),
        difficulty: Some(Difficulty::Medium),
        cooking_time: Some(CookingTime::Minutes(minutes)),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        created_at: base - Duration::days(age_days),
    }
}

type CatalogRow = (
    &'static str,
    &'static str,
    RecipeCategory,
    u32,
    &'static [&'static str],
    i64,
);

const CATALOG: &[CatalogRow] = &[
    ("a", "Bò xào hành", RecipeCategory::MainDish, 30, &["300g beef", "1 củ onion", "garlic"], 10),
    ("b", "Bò kho gừng", RecipeCategory::MainDish, 90, &["beef", "ginger"], 9),
    ("c", "Bò lúc lắc", RecipeCategory::MainDish, 35, &["beef", "onion", "chili"], 8),
    ("d", "Chè đậu xanh", RecipeCategory::Dessert, 60, &["đậu xanh", "đường"], 7),
    ("e", "Trà sữa", RecipeCategory::Beverage, 15, &["trà", "sữa", "đường"], 6),
    ("x", "Canh chua", RecipeCategory::SideDish, 40, &["cá", "cà chua"], 5),
    ("y", "Gỏi cuốn", RecipeCategory::Snack, 25, &["tôm", "bún"], 4),
    ("z", "Cá kho tộ", RecipeCategory::MainDish, 120, &["cá", "nước mắm"], 3),
];

/// Small catalog with one content-driven user, one rating-driven user and peers
fn catalog() -> Snapshot {
    let mut snapshot = Snapshot::default();
    for (id, name, category, minutes, ingredients, age_days) in CATALOG {
        snapshot.add_recipe(recipe(id, name, *category, *minutes, ingredients, *age_days));
    }
    snapshot
        // content-driven user
        .add_favorite("u-content", "a")
        .add_favorite("u-content", "b")
        .add_view("u-content", "c")
        // rating-driven user
        .add_feedback("u-rater", "x", 5)
        .add_feedback("u-rater", "y", 1)
        // peers agreeing with u-rater
        .add_feedback("p1", "x", 5)
        .add_feedback("p1", "y", 1)
        .add_feedback("p1", "z", 5)
        .add_feedback("p1", "d", 3)
        .add_feedback("p2", "x", 5)
        .add_feedback("p2", "y", 1)
        .add_feedback("p2", "z", 5)
        // peer disagreeing with u-rater
        .add_feedback("p3", "x", 1)
        .add_feedback("p3", "y", 5)
        .add_feedback("p3", "e", 5)
        .set_user_name("p1", "Lan")
        .set_user_name("p2", "Minh");
    snapshot
}

fn engine() -> RecommendationEngine<SnapshotStore> {
    RecommendationEngine::new(
        Arc::new(SnapshotStore::new(catalog())),
        RecommendationConfig::default(),
    )
}

#[tokio::test]
async fn test_favorites_never_recommended() {
    init_tracing();
    let response = engine().recommend("u-content", 20).await.unwrap();

    assert!(!response.is_fallback);
    assert!(!response.items.is_empty());
    let ids = response.recipe_ids();
    assert!(!ids.contains(&"a"));
    assert!(!ids.contains(&"b"));
}

#[tokio::test]
async fn test_similar_favorite_explains_content_match() {
    init_tracing();
    let response = engine().recommend("u-content", 10).await.unwrap();

    let c = response
        .items
        .iter()
        .find(|item| item.recipe.id == "c")
        .expect("c should be recommended");
    assert!(c.content_score > 0.0);
    assert_eq!(response.items[0].recipe.id, "c");
    assert!(c.reasons[0].contains("Bò xào hành"));
    assert!(!c.reasons[0].contains("Bò kho gừng"));
}

#[tokio::test]
async fn test_correlated_peers_surface_their_favorite() {
    init_tracing();
    let response = engine().recommend("u-rater", 10).await.unwrap();

    let z = response
        .items
        .iter()
        .find(|item| item.recipe.id == "z")
        .expect("z should be recommended");
    assert_eq!(z.collaborative_score, 1.0);
    assert!(z.reasons.iter().any(|r| r.contains("Lan") && r.contains("Minh")));

    // p3 is anti-correlated, so e gets no peer support
    if let Some(e) = response.items.iter().find(|item| item.recipe.id == "e") {
        assert_eq!(e.collaborative_score, 0.0);
    }

    let max_collaborative = response
        .items
        .iter()
        .map(|item| item.collaborative_score)
        .fold(0.0_f64, f64::max);
    assert_eq!(max_collaborative, 1.0);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let engine = engine();

    let first = engine.recommend("u-content", 10).await.unwrap();
    let second = engine.recommend("u-content", 10).await.unwrap();

    assert_eq!(first.recipe_ids(), second.recipe_ids());
    for (a, b) in first.items.iter().zip(second.items.iter()) {
        assert_eq!(a.final_score, b.final_score);
        assert_eq!(a.reasons, b.reasons);
    }
    assert_eq!(first.weights_used, second.weights_used);
}

#[tokio::test]
async fn test_cold_start_equals_popularity_ranking() {
    init_tracing();
    let store = Arc::new(SnapshotStore::new(catalog()));
    let engine = RecommendationEngine::new(Arc::clone(&store), RecommendationConfig::default());

    let response = engine.recommend("newcomer", 4).await.unwrap();

    let pool = store.get_popular_recipes(4 * 3).await.unwrap();
    let expected = rank_popular(pool, 4);

    assert!(response.is_fallback);
    assert_eq!(
        response.recipe_ids(),
        expected
            .iter()
            .map(|item| item.recipe.id.as_str())
            .collect::<Vec<_>>()
    );
    assert_eq!(response.items[0].final_score, 1.0);
}

fn cold_start_engine(snapshot: Snapshot) -> RecommendationEngine<SnapshotStore> {
    RecommendationEngine::new(
        Arc::new(SnapshotStore::new(snapshot)),
        RecommendationConfig::default(),
    )
}

#[tokio::test]
async fn test_cold_start_picks_best_rated_over_most_favorited() {
    init_tracing();
    let mut snapshot = Snapshot::default();
    snapshot.add_recipe(recipe("star", "Phở bò", RecipeCategory::MainDish, 60, &["beef"], 30));
    for rater in ["r1", "r2", "r3"] {
        snapshot.add_feedback(rater, "star", 5);
    }
    for i in 0..3 {
        let id = format!("busy{i}");
        snapshot.add_recipe(recipe(&id, &id, RecipeCategory::Snack, 10, &["bún"], 1));
        snapshot.add_feedback("critic", &id, 1);
        for fan in 0..10 {
            snapshot.add_favorite(&format!("fan{fan}"), &id);
        }
    }

    let response = cold_start_engine(snapshot).recommend("newcomer", 1).await.unwrap();

    assert!(response.is_fallback);
    assert_eq!(response.recipe_ids(), vec!["star"]);
}

#[tokio::test]
async fn test_cold_start_without_ratings_serves_newest() {
    let mut snapshot = Snapshot::default();
    for i in 0..3 {
        let id = format!("old{i}");
        snapshot.add_recipe(recipe(&id, &id, RecipeCategory::Dessert, 20, &["đường"], 60));
        snapshot.add_favorite("fan", &id);
    }
    snapshot.add_recipe(recipe("newest", "Chè bưởi", RecipeCategory::Dessert, 40, &["bưởi"], 1));

    let response = cold_start_engine(snapshot).recommend("newcomer", 1).await.unwrap();

    assert!(response.is_fallback);
    assert_eq!(response.recipe_ids(), vec!["newest"]);
}

#[tokio::test]
async fn test_weights_stay_within_bounds() {
    let engine = engine();

    for user in ["u-content", "u-rater", "p1", "p3", "newcomer"] {
        let response = engine.recommend(user, 10).await.unwrap();
        let weights = response.weights_used;
        assert!((0.2..=0.8).contains(&weights.content), "{user}: {weights:?}");
        assert!((0.2..=0.8).contains(&weights.collaborative), "{user}: {weights:?}");
        assert!((0.0..=1.0).contains(&weights.data_quality));
    }
}

#[tokio::test]
async fn test_limit_is_clamped_and_truncates() {
    let engine = engine();

    let one = engine.recommend("u-content", 1).await.unwrap();
    assert_eq!(one.items.len(), 1);

    let huge = engine.recommend("u-content", 10_000).await.unwrap();
    assert!(huge.items.len() <= engine.config().max_limit);

    let none = engine.recommend("u-content", 0).await.unwrap();
    assert!(none.items.is_empty());

    let defaulted = engine.recommend_default("u-content").await.unwrap();
    assert!(defaulted.items.len() <= engine.config().default_limit);
    assert!(!defaulted.items.is_empty());
}

#[tokio::test]
async fn test_blank_user_is_rejected() {
    let err = engine().recommend("", 10).await.unwrap_err();
    assert!(matches!(err, RecommendationError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_by_category_matches_flat_ranking() {
    let engine = engine();

    let flat = engine.recommend("u-content", 100).await.unwrap();
    let grouped = engine.recommend_by_category("u-content", 1).await.unwrap();

    for (category, items) in &grouped.categories {
        assert_eq!(items.len(), 1);
        let best_in_flat = flat
            .items
            .iter()
            .find(|item| item.recipe.category == Some(*category))
            .unwrap();
        assert_eq!(items[0].recipe.id, best_in_flat.recipe.id);
    }
    assert!(grouped.categories.contains_key(&RecipeCategory::MainDish));
}

#[tokio::test]
async fn test_cold_start_by_category_is_fallback() {
    let grouped = engine().recommend_by_category("newcomer", 2).await.unwrap();

    assert!(grouped.is_fallback);
    assert!(grouped.categories.values().all(|items| items.len() <= 2));
}

#[tokio::test]
async fn test_response_serializes_camel_case() {
    let response = engine().recommend("u-content", 3).await.unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert!(json.get("isFallback").is_some());
    assert!(json["weightsUsed"].get("content").is_some());
    assert!(json["items"][0].get("matchPercentage").is_some());
    assert!(json["items"][0]["recipe"].get("createdAt").is_some());
}

#[test]
fn test_snapshot_file_round_trip() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_vec(&catalog()).unwrap()).unwrap();

    let store = SnapshotStore::from_json_file(file.path()).unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let favorites = runtime.block_on(store.get_favorites("u-content")).unwrap();

    assert_eq!(favorites.len(), 2);
}
