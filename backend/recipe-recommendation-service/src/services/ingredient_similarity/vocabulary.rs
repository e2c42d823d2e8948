// Fixed lookup tables for ingredient matching. Built at compile time, shared
// read-only across requests.

use crate::models::RecipeCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngredientCategory {
    Meat,
    Vegetable,
    Spice,
    Grain,
    Dairy,
    Other,
}

/// Category keywords; an ingredient belongs to the first category with a matching keyword
pub const INGREDIENT_CATEGORIES: &[(IngredientCategory, &[&str])] = &[
    (
        IngredientCategory::Meat,
        &[
            "thịt", "bò", "heo", "lợn", "gà", "vịt", "cá", "tôm", "mực", "cua", "hải sản",
            "beef", "pork", "chicken", "duck", "fish", "shrimp", "prawn", "squid", "seafood",
        ],
    ),
    (
        IngredientCategory::Vegetable,
        &[
            "rau", "cải", "cà chua", "cà rốt", "khoai", "hành", "nấm", "dưa", "bí", "giá",
            "đậu", "onion", "cabbage", "carrot", "tomato", "potato", "mushroom", "lettuce",
            "vegetable", "bean",
        ],
    ),
    (
        IngredientCategory::Spice,
        &[
            "tỏi", "gừng", "ớt", "tiêu", "sả", "muối", "đường", "nước mắm", "hạt nêm", "quế",
            "hồi", "nghệ", "garlic", "ginger", "chili", "chilli", "pepper", "salt", "sugar",
            "fish sauce", "lemongrass", "cinnamon",
        ],
    ),
    (
        IngredientCategory::Grain,
        &[
            "gạo", "cơm", "bún", "phở", "mì", "miến", "bột", "nếp", "bánh mì", "rice",
            "noodle", "flour", "bread", "oat",
        ],
    ),
    (
        IngredientCategory::Dairy,
        &[
            "sữa", "bơ", "phô mai", "kem", "milk", "butter", "cheese", "cream", "yogurt",
        ],
    ),
];

/// Canonical ingredient → alternate spellings and translations
pub const INGREDIENT_SYNONYMS: &[(&str, &[&str])] = &[
    ("thịt bò", &["bò", "beef"]),
    ("thịt heo", &["thịt lợn", "heo", "lợn", "pork"]),
    ("thịt gà", &["gà", "chicken"]),
    ("tôm", &["shrimp", "prawn"]),
    ("mực", &["squid"]),
    ("hành tây", &["onion"]),
    ("hành lá", &["scallion", "green onion"]),
    ("tỏi", &["garlic"]),
    ("gừng", &["ginger"]),
    ("ớt", &["chili", "chilli"]),
    ("cà chua", &["tomato"]),
    ("khoai tây", &["potato"]),
    ("nước mắm", &["fish sauce"]),
    ("đường", &["sugar"]),
    ("sữa", &["milk"]),
    ("trứng", &["egg"]),
    ("gạo", &["rice"]),
];

/// Measure words dropped during normalization, with or without a quantity
pub const MEASURE_UNITS: &[&str] = &[
    "kg", "kilogram", "kilograms", "gram", "grams", "gr", "g", "ml", "lít", "lit", "liter",
    "liters", "litre", "l", "muỗng", "thìa", "tbsp", "tsp", "chén", "bát", "cup", "cups",
];

/// Classifiers dropped only right after a quantity ("2 trái chanh", but "trái cây" stays)
pub const COUNT_WORDS: &[&str] = &[
    "củ", "tép", "quả", "trái", "cái", "con", "miếng", "lát", "nhánh", "bó",
];

/// Recipe categories whose favorites may be cited as a "similar dish" for each other
pub fn related_categories(category: RecipeCategory) -> &'static [RecipeCategory] {
    match category {
        RecipeCategory::MainDish => &[RecipeCategory::MainDish, RecipeCategory::SideDish],
        RecipeCategory::SideDish => &[RecipeCategory::SideDish, RecipeCategory::MainDish],
        RecipeCategory::Dessert => &[
            RecipeCategory::Dessert,
            RecipeCategory::Beverage,
            RecipeCategory::Snack,
        ],
        RecipeCategory::Beverage => &[RecipeCategory::Beverage, RecipeCategory::Dessert],
        RecipeCategory::Snack => &[RecipeCategory::Snack, RecipeCategory::Dessert],
    }
}
