use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::nutrition::{KCAL_PER_G_CARB, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN};
use crate::models::{MealPlan, Recipe};
use crate::scoring::aggregator::{Dimension, EvaluationInput, ScoreResult, Scorer};
use crate::scoring::config::QualityParams;
use crate::scoring::constants::{
    CONSISTENCY_CV_CEILING, MEAL_CALORIE_SHARES, MEAL_DISTRIBUTION_TOLERANCE,
};
use crate::scoring::knowledge::IngredientKnowledge;

/// The three quality heuristics, their mean, and diagnostics outside the score.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityScore {
    pub score: f64,
    pub diversity: f64,
    pub feasibility: f64,
    pub balance: f64,
    pub ingredient_diversity: f64,
    pub protein_diversity: f64,
    pub macro_consistency: f64,
    pub meal_distribution: f64,
    pub violations: Vec<String>,
}

/// Distinct recipe names over total meal slots.
pub fn diversity(plan: &MealPlan) -> f64 {
    let slots = plan.slot_count();
    if slots == 0 {
        return 0.0;
    }
    let distinct: BTreeSet<String> = plan.meals().map(|m| m.recipe.key()).collect();
    distinct.len() as f64 / slots as f64
}

/// Why a recipe is not internally consistent, if it isn't.
pub fn infeasibility(recipe: &Recipe, params: &QualityParams) -> Option<String> {
    if recipe.ingredients.is_empty() {
        return Some("has no ingredients".to_string());
    }
    if let Some(bad) = recipe
        .ingredients
        .iter()
        .find(|i| i.key().is_empty() || i.amount_g <= 0.0)
    {
        return Some(format!("has an invalid portion for '{}'", bad.name));
    }

    let n = &recipe.nutrition;
    if !n.is_non_negative() {
        return Some("has negative nutrition values".to_string());
    }
    if n.calories <= 0.0 {
        return Some("has no calories".to_string());
    }
    let gap = (n.macro_energy() - n.calories).abs() / n.calories;
    if gap > params.energy_consistency_tolerance {
        return Some(format!(
            "states {:.0} kcal but its macros add up to {:.0} kcal",
            n.calories,
            n.macro_energy()
        ));
    }
    None
}

pub fn is_feasible(recipe: &Recipe, params: &QualityParams) -> bool {
    infeasibility(recipe, params).is_none()
}

/// Share of meal slots whose recipe is internally consistent.
pub fn feasibility(plan: &MealPlan, params: &QualityParams) -> f64 {
    let slots = plan.slot_count();
    if slots == 0 {
        return 0.0;
    }
    let feasible = plan.meals().filter(|m| is_feasible(m.recipe, params)).count();
    feasible as f64 / slots as f64
}

/// Share of days whose calories stay within `threshold` of the plan's daily average.
pub fn balance(plan: &MealPlan, threshold: f64) -> f64 {
    let calories: Vec<f64> = plan.daily_totals().iter().map(|t| t.calories).collect();
    match calories.len() {
        0 => return 0.0,
        1 => return 1.0,
        _ => {}
    }
    let mean = calories.iter().sum::<f64>() / calories.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let steady = calories
        .iter()
        .filter(|c| (*c - mean).abs() / mean <= threshold)
        .count();
    steady as f64 / calories.len() as f64
}

/// Distinct ingredient names over ingredient lines.
pub fn ingredient_diversity(plan: &MealPlan) -> f64 {
    let names: Vec<String> = plan
        .meals()
        .flat_map(|m| m.recipe.ingredients.iter().map(|i| i.key()))
        .collect();
    if names.is_empty() {
        return 0.0;
    }
    let distinct: BTreeSet<&String> = names.iter().collect();
    distinct.len() as f64 / names.len() as f64
}

/// Distinct protein sources over protein-source ingredient lines.
pub fn protein_diversity(plan: &MealPlan, knowledge: &IngredientKnowledge) -> f64 {
    let sources: Vec<String> = plan
        .meals()
        .flat_map(|m| m.recipe.ingredients.iter().map(|i| i.key()))
        .filter(|name| knowledge.is_protein_source(name))
        .collect();
    if sources.is_empty() {
        return 0.0;
    }
    let distinct: BTreeSet<&String> = sources.iter().collect();
    distinct.len() as f64 / sources.len() as f64
}

/// 1.0 for a constant series, falling linearly to 0 at the CV ceiling.
fn consistency(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 1.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if mean == 0.0 {
        return if std == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - (std / mean) / CONSISTENCY_CV_CEILING).max(0.0)
}

/// How steady the protein/fat/carb energy split is from day to day.
///
/// Mean of the three per-macro consistencies. Days without macro energy are skipped.
pub fn macro_consistency(plan: &MealPlan) -> f64 {
    let mut shares: [Vec<f64>; 3] = Default::default();
    for totals in plan.daily_totals() {
        let energy = totals.macro_energy();
        if totals.calories <= 0.0 || energy <= 0.0 {
            continue;
        }
        shares[0].push(totals.protein_g * KCAL_PER_G_PROTEIN / energy);
        shares[1].push(totals.fat_g * KCAL_PER_G_FAT / energy);
        shares[2].push(totals.carbs_g * KCAL_PER_G_CARB / energy);
    }
    shares.iter().map(|s| consistency(s)).sum::<f64>() / 3.0
}

/// How closely each day splits its calories 25/35/40 over breakfast, lunch and dinner.
///
/// A day scores `1 - min(drift, 1)` where drift is the summed absolute share
/// error; days with no calories score 0. Returns the mean and one message per
/// day whose drift exceeds the tolerance.
pub fn meal_distribution(plan: &MealPlan) -> (f64, Vec<String>) {
    if plan.days.is_empty() {
        return (0.0, Vec::new());
    }

    let mut total_score = 0.0;
    let mut violations = Vec::new();
    for day in &plan.days {
        let calories = day.meals().map(|(_, r)| r.nutrition.calories);
        let day_total: f64 = calories.iter().sum();
        if day_total <= 0.0 {
            continue;
        }

        let shares = calories.map(|c| c / day_total);
        let drift: f64 = shares
            .iter()
            .zip(MEAL_CALORIE_SHARES)
            .map(|(actual, ideal)| (actual - ideal).abs())
            .sum();
        if drift > MEAL_DISTRIBUTION_TOLERANCE {
            violations.push(format!(
                "Poor meal distribution on day {}: {:.1}% / {:.1}% / {:.1}%",
                day.day,
                shares[0] * 100.0,
                shares[1] * 100.0,
                shares[2] * 100.0
            ));
        }
        total_score += 1.0 - drift.min(1.0);
    }
    (total_score / plan.days.len() as f64, violations)
}

/// Unweighted mean of diversity, feasibility and balance.
///
/// Ingredient and protein diversity, macro consistency and meal distribution
/// are reported alongside but do not enter the score.
pub fn score_quality(
    plan: &MealPlan,
    params: &QualityParams,
    knowledge: &IngredientKnowledge,
) -> QualityScore {
    let diversity = diversity(plan);
    let feasibility = feasibility(plan, params);
    let balance = balance(plan, params.balance_threshold);

    let mut violations = Vec::new();
    for meal in plan.meals() {
        if let Some(reason) = infeasibility(meal.recipe, params) {
            violations.push(format!("Infeasible recipe at {}: {}", meal.location(), reason));
        }
    }

    let daily = plan.daily_totals();
    if daily.len() > 1 {
        let mean = daily.iter().map(|t| t.calories).sum::<f64>() / daily.len() as f64;
        if mean > 0.0 {
            for (day, totals) in plan.days.iter().zip(&daily) {
                let deviation = (totals.calories - mean) / mean;
                if deviation.abs() > params.balance_threshold {
                    violations.push(format!(
                        "Day {} calories {:+.1}% from the plan average",
                        day.day,
                        deviation * 100.0
                    ));
                }
            }
        }
    }

    let (meal_distribution, distribution_violations) = meal_distribution(plan);
    violations.extend(distribution_violations);

    QualityScore {
        score: (diversity + feasibility + balance) / 3.0,
        diversity,
        feasibility,
        balance,
        ingredient_diversity: ingredient_diversity(plan),
        protein_diversity: protein_diversity(plan, knowledge),
        macro_consistency: macro_consistency(plan),
        meal_distribution,
        violations,
    }
}

/// Recipe diversity, portion feasibility and day-to-day calorie balance.
pub struct QualityScorer {
    params: QualityParams,
    knowledge: IngredientKnowledge,
}

impl QualityScorer {
    pub fn new(params: QualityParams, knowledge: IngredientKnowledge) -> Self {
        Self { params, knowledge }
    }
}

impl Scorer for QualityScorer {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn description(&self) -> &'static str {
        "Mean of recipe diversity, recipe feasibility and daily calorie balance"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Quality
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<ScoreResult> {
        let result = score_quality(input.plan, &self.params, &self.knowledge);
        Ok(ScoreResult::new(result.score)
            .with_violations(result.violations)
            .with_detail("diversity", result.diversity)
            .with_detail("feasibility", result.feasibility)
            .with_detail("balance", result.balance)
            .with_detail("ingredient_diversity", result.ingredient_diversity)
            .with_detail("protein_diversity", result.protein_diversity)
            .with_detail("macro_consistency", result.macro_consistency)
            .with_detail("meal_distribution", result.meal_distribution))
    }
}
