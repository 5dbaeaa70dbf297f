use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};
use crate::models::nutrition::{KCAL_PER_G_CARB, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN};
use crate::models::{MacroRatio, NutritionTotals};
use crate::scoring::aggregator::{Dimension, EvaluationInput, ScoreResult, Scorer};
use crate::scoring::config::NutritionTolerance;

/// Relative errors of the plan against the daily targets (0.1 = 10%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionErrors {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl NutritionErrors {
    /// Metric label and error, in reporting order.
    pub fn labeled(&self) -> [(&'static str, f64); 4] {
        [
            ("Calories", self.calories),
            ("Protein", self.protein),
            ("Fat", self.fat),
            ("Carbs", self.carbs),
        ]
    }

    pub fn max(&self) -> f64 {
        self.labeled().iter().map(|(_, e)| *e).fold(0.0, f64::max)
    }
}

/// Result of scoring plan totals against nutrition targets.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionScore {
    pub score: f64,
    pub errors: NutritionErrors,
    pub violations: Vec<String>,
}

/// `|actual - target| / target`.
pub fn relative_error(actual: f64, target: f64) -> f64 {
    (actual - target).abs() / target
}

/// Credit for one metric: full inside the tolerance, linear down to zero at the ceiling.
pub fn metric_score(error: f64, band: &NutritionTolerance) -> f64 {
    if error <= band.tolerance {
        return 1.0;
    }
    (1.0 - (error - band.tolerance) / (band.ceiling - band.tolerance)).max(0.0)
}

/// Error of one macro against its target grams.
///
/// A macro with a zero target share has no grams to compare against; its error
/// is the share of the calorie target it occupies anyway.
fn macro_error(actual_g: f64, target_g: f64, kcal_per_g: f64, target_calories: f64) -> f64 {
    if target_g > 0.0 {
        relative_error(actual_g, target_g)
    } else {
        actual_g.max(0.0) * kcal_per_g / target_calories
    }
}

/// Score daily totals against a calorie goal and macro split.
///
/// The score is the minimum of the four per-metric credits, so one badly
/// missed macro cannot be averaged away by the others.
pub fn score_nutrition(
    totals: &NutritionTotals,
    target_calories: f64,
    ratio: &MacroRatio,
    band: &NutritionTolerance,
) -> Result<NutritionScore> {
    if !target_calories.is_finite() || target_calories <= 0.0 {
        return Err(RewardError::validation(format!(
            "daily calorie target must be positive, got {}",
            target_calories
        )));
    }
    ratio.validate()?;
    if !totals.is_finite() {
        return Err(RewardError::computation(
            "plan nutrition totals",
            "totals contain a non-finite value",
        ));
    }

    let target = NutritionTotals::from_target(target_calories, ratio);
    let errors = NutritionErrors {
        calories: relative_error(totals.calories, target.calories),
        protein: macro_error(totals.protein_g, target.protein_g, KCAL_PER_G_PROTEIN, target_calories),
        fat: macro_error(totals.fat_g, target.fat_g, KCAL_PER_G_FAT, target_calories),
        carbs: macro_error(totals.carbs_g, target.carbs_g, KCAL_PER_G_CARB, target_calories),
    };

    let mut violations = Vec::new();
    let mut score: f64 = 1.0;
    for (label, error) in errors.labeled() {
        if error > band.tolerance {
            violations.push(format!("{} off by {:.1}%", label, error * 100.0));
        }
        score = score.min(metric_score(error, band));
    }

    Ok(NutritionScore {
        score,
        errors,
        violations,
    })
}

/// Compares the plan's average day against the calorie and macro targets.
pub struct NutritionScorer {
    band: NutritionTolerance,
}

impl NutritionScorer {
    pub fn new(band: NutritionTolerance) -> Self {
        Self { band }
    }
}

impl Scorer for NutritionScorer {
    fn name(&self) -> &'static str {
        "nutrition"
    }

    fn description(&self) -> &'static str {
        "Relative calorie and macro error of the average day against the targets"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Nutrition
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<ScoreResult> {
        let totals = input.plan.average_daily_totals();
        let result = score_nutrition(
            &totals,
            input.request.daily_calories,
            &input.request.macro_ratio,
            &self.band,
        )?;

        Ok(ScoreResult::new(result.score)
            .with_violations(result.violations)
            .with_detail("calories_error", result.errors.calories)
            .with_detail("protein_error", result.errors.protein)
            .with_detail("fat_error", result.errors.fat)
            .with_detail("carbs_error", result.errors.carbs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    fn ratio() -> MacroRatio {
        MacroRatio::new(30.0, 25.0, 45.0)
    }

    fn exact_totals() -> NutritionTotals {
        NutritionTotals::from_target(2000.0, &ratio())
    }

    #[test]
    fn test_exact_match_scores_one() {
        let band = NutritionTolerance::default();
        let result = score_nutrition(&exact_totals(), 2000.0, &ratio(), &band).unwrap();

        assert_eq!(result.score, 1.0);
        assert!(result.violations.is_empty());
        assert_float_absolute_eq!(result.errors.max(), 0.0, 1e-12);
    }

    #[test]
    fn test_within_tolerance_scores_one() {
        let band = NutritionTolerance::default();
        let mut totals = exact_totals();
        totals.calories = 2150.0; // 7.5%
        totals.protein_g *= 1.09;

        let result = score_nutrition(&totals, 2000.0, &ratio(), &band).unwrap();
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_linear_penalty_between_tolerance_and_ceiling() {
        let band = NutritionTolerance::default();
        let mut totals = exact_totals();
        totals.calories = 2600.0; // 30% -> halfway between 10% and 50%

        let result = score_nutrition(&totals, 2000.0, &ratio(), &band).unwrap();
        assert_float_absolute_eq!(result.score, 0.5, 1e-9);
        assert_eq!(result.violations, vec!["Calories off by 30.0%".to_string()]);
    }

    #[test]
    fn test_one_catastrophic_macro_is_not_averaged_away() {
        let band = NutritionTolerance::default();
        let mut totals = exact_totals();
        totals.fat_g *= 1.6; // 60% error, the other three are perfect

        let result = score_nutrition(&totals, 2000.0, &ratio(), &band).unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].starts_with("Fat off by"));
    }

    #[test]
    fn test_metric_score_edges() {
        let band = NutritionTolerance::default();
        assert_eq!(metric_score(0.10, &band), 1.0);
        assert_eq!(metric_score(0.50, &band), 0.0);
        assert_eq!(metric_score(2.00, &band), 0.0);
        assert_float_absolute_eq!(metric_score(0.20, &band), 0.75, 1e-12);
    }

    #[test]
    fn test_zero_share_macro() {
        let band = NutritionTolerance::default();
        let keto = MacroRatio::new(25.0, 75.0, 0.0);
        let mut totals = NutritionTotals::from_target(2000.0, &keto);

        let result = score_nutrition(&totals, 2000.0, &keto, &band).unwrap();
        assert_eq!(result.errors.carbs, 0.0);

        // 50 g carbs = 200 kcal = 10% of the target
        totals.carbs_g = 50.0;
        let result = score_nutrition(&totals, 2000.0, &keto, &band).unwrap();
        assert_float_absolute_eq!(result.errors.carbs, 0.10, 1e-12);
    }

    #[test]
    fn test_rejects_invalid_targets() {
        let band = NutritionTolerance::default();
        assert!(matches!(
            score_nutrition(&exact_totals(), 0.0, &ratio(), &band),
            Err(RewardError::Validation(_))
        ));
        assert!(matches!(
            score_nutrition(&exact_totals(), 2000.0, &MacroRatio::new(10.0, 10.0, 10.0), &band),
            Err(RewardError::Validation(_))
        ));
    }
}
