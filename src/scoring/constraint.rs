use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{MealPlan, normalize_name};
use crate::scoring::aggregator::{Dimension, EvaluationInput, ScoreResult, Scorer};
use crate::scoring::knowledge::IngredientKnowledge;

/// Result of checking a plan against allergens and dietary restrictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintScore {
    pub score: f64,
    pub violations: Vec<String>,
    pub allergen_violation: bool,
    /// Ingredient lines that broke at least one restriction.
    pub restricted_ingredients: usize,
    pub total_ingredients: usize,
}

/// Title-case the first letter of a restriction tag for messages.
fn display_tag(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Check every ingredient line of the plan.
///
/// Any allergen hit zeroes the score. Restriction mismatches alone cost
/// `violating_lines / total_lines`, floored at zero.
pub fn score_constraints(
    plan: &MealPlan,
    restrictions: &BTreeSet<String>,
    allergens: &BTreeSet<String>,
    knowledge: &IngredientKnowledge,
) -> Result<ConstraintScore> {
    // Unknown tags must fail even when the plan has no ingredients.
    knowledge.check_restrictions(restrictions)?;

    let allergens: BTreeSet<String> = allergens
        .iter()
        .map(|a| normalize_name(a))
        .filter(|a| !a.is_empty())
        .collect();

    let mut result = ConstraintScore::default();

    for meal in plan.meals() {
        for ingredient in &meal.recipe.ingredients {
            result.total_ingredients += 1;

            for allergen in &allergens {
                if knowledge.contains_allergen(&ingredient.name, allergen) {
                    result.allergen_violation = true;
                    result.violations.push(format!(
                        "Allergen '{}' found in {} ({})",
                        allergen,
                        ingredient.name,
                        meal.location()
                    ));
                }
            }

            let mut restricted = false;
            for tag in restrictions {
                if let Some(category) = knowledge.restriction_violation(&ingredient.name, tag)? {
                    restricted = true;
                    result.violations.push(format!(
                        "{} restriction violated by {} [{}] ({})",
                        display_tag(tag),
                        ingredient.name,
                        category,
                        meal.location()
                    ));
                }
            }
            if restricted {
                result.restricted_ingredients += 1;
            }
        }
    }

    result.score = if result.allergen_violation {
        0.0
    } else if result.total_ingredients == 0 {
        1.0
    } else {
        (1.0 - result.restricted_ingredients as f64 / result.total_ingredients as f64).max(0.0)
    };

    Ok(result)
}

/// Allergen and dietary-restriction compliance.
pub struct ConstraintScorer {
    knowledge: IngredientKnowledge,
}

impl ConstraintScorer {
    pub fn new(knowledge: IngredientKnowledge) -> Self {
        Self { knowledge }
    }
}

impl Scorer for ConstraintScorer {
    fn name(&self) -> &'static str {
        "constraint"
    }

    fn description(&self) -> &'static str {
        "Allergen zero-tolerance and proportional dietary-restriction penalty"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Constraint
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<ScoreResult> {
        let result = score_constraints(
            input.plan,
            &input.request.dietary_restrictions,
            &input.request.allergens,
            &self.knowledge,
        )?;

        let mut out = ScoreResult::new(result.score)
            .with_violations(result.violations)
            .with_detail("restricted_ingredients", result.restricted_ingredients as f64)
            .with_detail("total_ingredients", result.total_ingredients as f64);
        out.allergen_violation = result.allergen_violation;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RewardError;
    use crate::models::{Day, NutritionTotals, Recipe, RecipeIngredient};
    use crate::scoring::config::ConstraintParams;

    fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
        Recipe::new(
            name,
            ingredients
                .iter()
                .map(|i| RecipeIngredient::new(i, 100.0))
                .collect(),
            NutritionTotals::new(600.0, 40.0, 20.0, 60.0),
        )
    }

    fn plan(breakfast: Recipe, lunch: Recipe, dinner: Recipe) -> MealPlan {
        MealPlan::new(
            "t1",
            "test",
            vec![Day {
                day: 1,
                breakfast,
                lunch,
                dinner,
            }],
        )
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_plan_scores_one() {
        let p = plan(
            recipe("Oatmeal", &["oats", "banana"]),
            recipe("Salad", &["spinach", "tomato"]),
            recipe("Stir Fry", &["tofu", "broccoli"]),
        );
        let k = IngredientKnowledge::builtin();
        let result = score_constraints(&p, &set(&["vegetarian"]), &set(&["egg"]), &k).unwrap();

        assert_eq!(result.score, 1.0);
        assert!(result.violations.is_empty());
        assert!(!result.allergen_violation);
        assert_eq!(result.total_ingredients, 6);
    }

    #[test]
    fn test_mayonnaise_trips_egg_allergy() {
        let p = plan(
            recipe("Sandwich", &["bread", "mayonnaise", "lettuce"]),
            recipe("Salad", &["spinach"]),
            recipe("Soup", &["lentils"]),
        );
        let k = IngredientKnowledge::builtin();
        let result = score_constraints(&p, &BTreeSet::new(), &set(&["egg"]), &k).unwrap();

        assert_eq!(result.score, 0.0);
        assert!(result.allergen_violation);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].contains("mayonnaise"));
        assert!(result.violations[0].contains("'egg'"));
        assert!(result.violations[0].contains("day 1 breakfast 'Sandwich'"));
    }

    #[test]
    fn test_restriction_penalty_is_proportional() {
        let p = plan(
            recipe("Eggs", &["egg", "spinach"]),
            recipe("Chicken Bowl", &["chicken breast", "rice"]),
            recipe("Pasta", &["pasta", "tomato"]),
        );
        let k = IngredientKnowledge::builtin();
        let result = score_constraints(&p, &set(&["vegetarian"]), &BTreeSet::new(), &k).unwrap();

        assert!(!result.allergen_violation);
        assert_eq!(result.restricted_ingredients, 1);
        assert_eq!(result.total_ingredients, 6);
        assert!((result.score - (1.0 - 1.0 / 6.0)).abs() < 1e-12);
        assert!(result.violations[0].starts_with("Vegetarian restriction violated by chicken breast"));
    }

    #[test]
    fn test_line_breaking_two_restrictions_counts_once() {
        let p = plan(
            recipe("A", &["bacon"]),
            recipe("B", &["apple"]),
            recipe("C", &["pear"]),
        );
        let k = IngredientKnowledge::builtin();
        let result =
            score_constraints(&p, &set(&["vegetarian", "pescatarian"]), &BTreeSet::new(), &k).unwrap();

        assert_eq!(result.violations.len(), 2);
        assert_eq!(result.restricted_ingredients, 1);
        assert!((result.score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_plan_ingredients_score_one() {
        let p = plan(recipe("A", &[]), recipe("B", &[]), recipe("C", &[]));
        let k = IngredientKnowledge::builtin();
        let result = score_constraints(&p, &set(&["vegan"]), &set(&["nuts"]), &k).unwrap();
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_unknown_restriction_fails_fast() {
        let p = plan(recipe("A", &[]), recipe("B", &[]), recipe("C", &[]));
        let k = IngredientKnowledge::builtin();
        assert!(matches!(
            score_constraints(&p, &set(&["fruitarian"]), &BTreeSet::new(), &k),
            Err(RewardError::Validation(_))
        ));
    }

    #[test]
    fn test_plural_and_category_allergens() {
        let p = plan(
            recipe("Sandwich", &["bread", "mayonnaise"]),
            recipe("Trail Mix", &["almond", "walnut"]),
            recipe("Gratin", &["cheddar cheese", "potato"]),
        );
        let k = IngredientKnowledge::builtin();

        for allergen in ["eggs", "tree nuts", "nut", "dairy products"] {
            let result = score_constraints(&p, &BTreeSet::new(), &set(&[allergen]), &k).unwrap();
            assert!(result.allergen_violation, "{} was not detected", allergen);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_coconut_milk_passes_milk_allergy_and_vegan() {
        let p = plan(
            recipe("Curry", &["coconut milk", "chickpeas"]),
            recipe("Porridge", &["oat milk", "oats"]),
            recipe("Smoothie", &["banana"]),
        );
        let k = IngredientKnowledge::builtin();
        let result = score_constraints(&p, &set(&["vegan"]), &set(&["milk"]), &k).unwrap();

        assert!(!result.allergen_violation);
        assert_eq!(result.restricted_ingredients, 0);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_configured_implication() {
        let mut params = ConstraintParams::default();
        params
            .extra_implications
            .insert("custard".to_string(), vec!["egg".to_string()]);
        let scorer = ConstraintScorer::new(IngredientKnowledge::from_params(&params));

        let p = plan(
            recipe("Dessert", &["vanilla custard"]),
            recipe("B", &["apple"]),
            recipe("C", &["pear"]),
        );
        let result =
            score_constraints(&p, &BTreeSet::new(), &set(&["egg"]), &scorer.knowledge).unwrap();
        assert!(result.allergen_violation);
    }
}
