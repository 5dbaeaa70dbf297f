use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};
use crate::models::normalize_name;
use crate::models::nutrition::NutritionTotals;

/// The three meals of a planned day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        };
        f.write_str(name)
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub amount_g: f64,
}

impl RecipeIngredient {
    pub fn new(name: &str, amount_g: f64) -> Self {
        Self {
            name: name.to_string(),
            amount_g,
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A single meal with its ingredient list and precomputed nutrition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    pub nutrition: NutritionTotals,
}

impl Recipe {
    pub fn new(name: &str, ingredients: Vec<RecipeIngredient>, nutrition: NutritionTotals) -> Self {
        Self {
            name: name.to_string(),
            ingredients,
            nutrition,
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// One day of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub day: u32,
    pub breakfast: Recipe,
    pub lunch: Recipe,
    pub dinner: Recipe,
}

impl Day {
    pub fn recipe(&self, slot: MealSlot) -> &Recipe {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::Lunch => &self.lunch,
            MealSlot::Dinner => &self.dinner,
        }
    }

    /// Meals in serving order.
    pub fn meals(&self) -> [(MealSlot, &Recipe); 3] {
        MealSlot::ALL.map(|slot| (slot, self.recipe(slot)))
    }

    pub fn totals(&self) -> NutritionTotals {
        self.meals().iter().map(|(_, r)| r.nutrition).sum()
    }
}

/// A recipe together with where it sits in the plan.
#[derive(Debug, Clone, Copy)]
pub struct PlannedMeal<'a> {
    pub day: u32,
    pub slot: MealSlot,
    pub recipe: &'a Recipe,
}

impl PlannedMeal<'_> {
    /// Human-readable location, e.g. `day 2 lunch 'Lentil Soup'`.
    pub fn location(&self) -> String {
        format!("day {} {} '{}'", self.day, self.slot, self.recipe.name)
    }
}

/// A completed multi-day plan as produced by the planning loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub scenario_id: String,
    #[serde(default)]
    pub model: String,
    pub days: Vec<Day>,
}

impl MealPlan {
    pub fn new(scenario_id: &str, model: &str, days: Vec<Day>) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            model: model.to_string(),
            days,
        }
    }

    /// Every meal slot across the horizon, in order.
    pub fn meals(&self) -> impl Iterator<Item = PlannedMeal<'_>> {
        self.days.iter().flat_map(|day| {
            day.meals().into_iter().map(move |(slot, recipe)| PlannedMeal {
                day: day.day,
                slot,
                recipe,
            })
        })
    }

    pub fn slot_count(&self) -> usize {
        self.days.len() * MealSlot::ALL.len()
    }

    pub fn daily_totals(&self) -> Vec<NutritionTotals> {
        self.days.iter().map(Day::totals).collect()
    }

    /// Per-day average nutrition over the whole horizon.
    pub fn average_daily_totals(&self) -> NutritionTotals {
        let total: NutritionTotals = self.daily_totals().into_iter().sum();
        total.scaled_down(self.days.len())
    }

    /// Reject numbers no scorer can work with.
    ///
    /// Non-finite nutrition or amounts are reported with the meal they came from.
    pub fn check_numbers(&self) -> Result<()> {
        for meal in self.meals() {
            if !meal.recipe.nutrition.is_finite() {
                return Err(RewardError::computation(
                    meal.location(),
                    "nutrition summary contains a non-finite value",
                ));
            }
            for ingredient in &meal.recipe.ingredients {
                if !ingredient.amount_g.is_finite() {
                    return Err(RewardError::computation(
                        meal.location(),
                        format!("ingredient '{}' has a non-finite amount", ingredient.name),
                    ));
                }
            }
        }
        Ok(())
    }
}
