#![allow(dead_code)]

use std::collections::BTreeSet;

use meal_reward_rs::models::{
    Day, InventoryItem, MacroRatio, MealPlan, MealPlanRequest, NutritionTotals, Recipe,
    RecipeIngredient,
};

pub const DAILY_CALORIES: f64 = 2000.0;

/// One third of the 2000 kcal / (30, 25, 45) daily target.
pub fn third_of_target() -> NutritionTotals {
    let day = NutritionTotals::from_target(DAILY_CALORIES, &MacroRatio::new(30.0, 25.0, 45.0));
    day.scaled_down(3)
}

pub fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
    Recipe::new(
        name,
        ingredients
            .iter()
            .map(|i| RecipeIngredient::new(i, 100.0))
            .collect(),
        third_of_target(),
    )
}

pub fn day(n: u32, breakfast: Recipe, lunch: Recipe, dinner: Recipe) -> Day {
    Day {
        day: n,
        breakfast,
        lunch,
        dinner,
    }
}

/// Three days, nine distinct recipes, every ingredient on hand, exact targets.
pub fn perfect_plan() -> MealPlan {
    let days = (1..=3)
        .map(|n| {
            day(
                n,
                recipe(&format!("Oatmeal {}", n), &["oats", "banana"]),
                recipe(&format!("Chicken Bowl {}", n), &["chicken breast", "rice", "broccoli"]),
                recipe(&format!("Salmon Plate {}", n), &["salmon", "potato", "tomato"]),
            )
        })
        .collect();
    MealPlan::new("s1", "model-a", days)
}

pub fn inventory() -> Vec<InventoryItem> {
    ["oats", "banana", "chicken breast", "rice", "broccoli", "salmon", "potato", "tomato"]
        .iter()
        .map(|name| InventoryItem::new(name, 2000.0))
        .collect()
}

pub fn request() -> MealPlanRequest {
    MealPlanRequest {
        inventory: inventory(),
        daily_calories: DAILY_CALORIES,
        macro_ratio: MacroRatio::new(30.0, 25.0, 45.0),
        dietary_restrictions: BTreeSet::new(),
        allergens: BTreeSet::new(),
        days: 3,
    }
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
