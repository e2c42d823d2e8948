// ============================================
// Ingredient Similarity Engine
// ============================================
//
// Scores how well a candidate recipe's ingredient list matches the weighted
// ingredient set of a preference profile.
//
// Pair tiers (candidate ingredient × profile ingredient):
//   exact equality      → 1.0 × weight
//   containment         → 0.7 × weight
//   synonym             → 0.8 × weight
//   same category       → 0.3 × weight   (never for "other")
//
// similarity = Σ matched / (Σ profile weight × candidate ingredient count)

mod vocabulary;

pub use vocabulary::{related_categories, IngredientCategory};

use crate::models::Recipe;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;
use vocabulary::{COUNT_WORDS, INGREDIENT_CATEGORIES, INGREDIENT_SYNONYMS, MEASURE_UNITS};

const CONTAINMENT_FACTOR: f64 = 0.7;
const SYNONYM_FACTOR: f64 = 0.8;
const CATEGORY_FACTOR: f64 = 0.3;
const MAX_COMMON_INGREDIENTS: usize = 5;
/// Shared ingredients needed before a favorite is cited as "similar"
const MIN_SHARED_FOR_SIMILAR_FAVORITE: usize = 2;

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    let mut units: Vec<&str> = MEASURE_UNITS.iter().chain(COUNT_WORDS).copied().collect();
    units.extend(["muỗng canh", "muỗng cà phê", "thìa canh", "thìa cà phê"]);
    units.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    let pattern = format!(r"\d+(?:[.,/]\d+)?\s*(?:(?:{})\b)?", units.join("|"));
    Regex::new(&pattern).expect("Failed to compile quantity pattern")
});

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;:()\[\]*•\-]").expect("Failed to compile punctuation pattern"));

/// Lower-case an ingredient line and strip quantities, measure words and digits
///
/// "300g Thịt bò" → "thịt bò", "2 muỗng canh nước mắm" → "nước mắm"
pub fn normalize_ingredient(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_punctuation = PUNCTUATION_RE.replace_all(&lower, " ");
    let without_quantities = QUANTITY_RE.replace_all(&without_punctuation, " ");

    without_quantities
        .split_whitespace()
        .filter(|token| !MEASURE_UNITS.contains(token))
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coarse category of a normalized ingredient
pub fn categorize(ingredient: &str) -> IngredientCategory {
    INGREDIENT_CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| ingredient.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(IngredientCategory::Other)
}

/// Indices of every synonym entry the ingredient matches
fn synonym_groups(ingredient: &str) -> Vec<usize> {
    INGREDIENT_SYNONYMS
        .iter()
        .enumerate()
        .filter(|(_, (canonical, alternates))| {
            ingredient.contains(canonical) || alternates.iter().any(|alt| ingredient.contains(alt))
        })
        .map(|(idx, _)| idx)
        .collect()
}

pub fn are_synonyms(a: &str, b: &str) -> bool {
    let groups_a = synonym_groups(a);
    if groups_a.is_empty() {
        return false;
    }
    synonym_groups(b).iter().any(|g| groups_a.contains(g))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Contains,
    Synonym,
    Category,
    None,
}

impl MatchTier {
    pub fn factor(&self) -> f64 {
        match self {
            MatchTier::Exact => 1.0,
            MatchTier::Contains => CONTAINMENT_FACTOR,
            MatchTier::Synonym => SYNONYM_FACTOR,
            MatchTier::Category => CATEGORY_FACTOR,
            MatchTier::None => 0.0,
        }
    }

    /// Exact, containment and synonym matches count as "common ingredients"
    pub fn is_direct(&self) -> bool {
        matches!(self, MatchTier::Exact | MatchTier::Contains | MatchTier::Synonym)
    }
}

/// A normalized ingredient with its lookups precomputed
#[derive(Debug, Clone)]
struct IndexedIngredient {
    name: String,
    category: IngredientCategory,
    synonyms: Vec<usize>,
}

impl IndexedIngredient {
    fn new(name: String) -> Self {
        let category = categorize(&name);
        let synonyms = synonym_groups(&name);
        Self {
            name,
            category,
            synonyms,
        }
    }

    fn tier(&self, other: &IndexedIngredient) -> MatchTier {
        if self.name == other.name {
            MatchTier::Exact
        } else if self.name.contains(other.name.as_str()) || other.name.contains(self.name.as_str())
        {
            MatchTier::Contains
        } else if self.synonyms.iter().any(|g| other.synonyms.contains(g)) {
            MatchTier::Synonym
        } else if self.category != IngredientCategory::Other && self.category == other.category {
            MatchTier::Category
        } else {
            MatchTier::None
        }
    }
}

fn index_ingredients(raw: &[String]) -> Vec<IndexedIngredient> {
    raw.iter()
        .map(|ingredient| normalize_ingredient(ingredient))
        .filter(|name| !name.is_empty())
        .map(IndexedIngredient::new)
        .collect()
}

/// Result of scoring one candidate's ingredients against a profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientMatch {
    pub similarity: f64,
    /// Up to 5 distinct candidate ingredients with a direct match
    pub common_ingredients: Vec<String>,
}

/// Favorite recipe cited as the closest match for a candidate
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarFavorite {
    pub recipe_id: String,
    pub name: String,
    pub shared_ingredients: usize,
}

/// Profile ingredient weights prepared for repeated candidate scoring
#[derive(Debug, Clone)]
pub struct IngredientIndex {
    entries: Vec<(IndexedIngredient, f64)>,
    weight_sum: f64,
}

impl IngredientIndex {
    pub fn new(weights: &HashMap<String, f64>) -> Self {
        let mut entries: Vec<(IndexedIngredient, f64)> = weights
            .iter()
            .filter(|(name, weight)| !name.is_empty() && **weight > 0.0)
            .map(|(name, weight)| (IndexedIngredient::new(name.clone()), *weight))
            .collect();
        // Stable order keeps floating-point sums reproducible
        entries.sort_by(|a, b| a.0.name.cmp(&b.0.name));

        let weight_sum = entries.iter().map(|(_, w)| *w).sum();

        Self {
            entries,
            weight_sum,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score a candidate ingredient list against the profile
    pub fn score(&self, candidate_ingredients: &[String]) -> IngredientMatch {
        let candidates = index_ingredients(candidate_ingredients);

        let total_weight = self.weight_sum * candidates.len() as f64;
        if total_weight <= 0.0 {
            return IngredientMatch::default();
        }

        let mut match_score = 0.0;
        let mut common: Vec<String> = Vec::new();

        for candidate in &candidates {
            for (profile_ingredient, weight) in &self.entries {
                let tier = candidate.tier(profile_ingredient);
                match_score += tier.factor() * weight;

                if tier.is_direct()
                    && common.len() < MAX_COMMON_INGREDIENTS
                    && !common.contains(&candidate.name)
                {
                    common.push(candidate.name.clone());
                }
            }
        }

        IngredientMatch {
            similarity: match_score / total_weight,
            common_ingredients: common,
        }
    }
}

/// Pick the favorite in a related category sharing the most common ingredients
///
/// Requires at least two common ingredients; ties go to the earliest favorite.
pub fn find_most_similar_favorite(
    candidate: &Recipe,
    common_ingredients: &[String],
    favorites: &[Recipe],
) -> Option<SimilarFavorite> {
    if common_ingredients.len() < MIN_SHARED_FOR_SIMILAR_FAVORITE {
        return None;
    }

    let related = related_categories(candidate.category?);
    let common: Vec<IndexedIngredient> = common_ingredients
        .iter()
        .cloned()
        .map(IndexedIngredient::new)
        .collect();

    let mut best: Option<(&Recipe, usize)> = None;

    for favorite in favorites {
        if favorite.id == candidate.id {
            continue;
        }
        match favorite.category {
            Some(category) if related.contains(&category) => {}
            _ => continue,
        }

        let favorite_ingredients = index_ingredients(&favorite.ingredients);
        let shared = common
            .iter()
            .filter(|c| favorite_ingredients.iter().any(|f| c.tier(f).is_direct()))
            .count();

        if shared >= MIN_SHARED_FOR_SIMILAR_FAVORITE
            && best.map_or(true, |(_, best_shared)| shared > best_shared)
        {
            best = Some((favorite, shared));
        }
    }

    best.map(|(recipe, shared)| {
        debug!(
            candidate_id = %candidate.id,
            favorite_id = %recipe.id,
            shared = shared,
            "Most similar favorite resolved"
        );
        SimilarFavorite {
            recipe_id: recipe.id.clone(),
            name: recipe.name.clone(),
            shared_ingredients: shared,
        }
    })
}
