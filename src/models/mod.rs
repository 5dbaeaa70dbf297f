pub mod nutrition;
pub mod plan;
pub mod request;

pub use nutrition::NutritionTotals;
pub use plan::{Day, MealPlan, MealSlot, PlannedMeal, Recipe, RecipeIngredient};
pub use request::{GroundTruth, InventoryItem, MacroRatio, MealPlanRequest, Scenario};

/// Canonical key for ingredient, recipe and tag lookups.
///
/// Lowercases, trims and collapses inner whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
