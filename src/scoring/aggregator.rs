use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, RewardError};
use crate::models::{MealPlan, MealPlanRequest};
use crate::scoring::config::{RewardWeights, ScoringConfig};
use crate::scoring::constraint::ConstraintScorer;
use crate::scoring::inventory::InventoryScorer;
use crate::scoring::knowledge::IngredientKnowledge;
use crate::scoring::nutrition::NutritionScorer;
use crate::scoring::quality::QualityScorer;

/// Which sub-score of the breakdown a scorer feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Nutrition,
    Constraint,
    Inventory,
    Quality,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Nutrition => "nutrition",
            Dimension::Constraint => "constraint",
            Dimension::Inventory => "inventory",
            Dimension::Quality => "quality",
        };
        f.write_str(name)
    }
}

/// The read-only inputs of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
    pub plan: &'a MealPlan,
    pub request: &'a MealPlanRequest,
    /// Normalized expected shopping list, when the scenario has one.
    pub ground_truth: Option<&'a BTreeSet<String>>,
}

/// Output of a single scorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreResult {
    /// Bounded score in [0, 1].
    pub score: f64,
    pub violations: Vec<String>,
    /// Set when a declared allergen was found; forces the total to zero.
    pub allergen_violation: bool,
    /// Named diagnostic numbers, e.g. relative errors.
    pub details: BTreeMap<String, f64>,
}

impl ScoreResult {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            ..Default::default()
        }
    }

    pub fn with_violations(mut self, violations: Vec<String>) -> Self {
        self.violations = violations;
        self
    }

    pub fn with_detail(mut self, key: &str, value: f64) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// One reward dimension: plan + request in, bounded score out.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn dimension(&self) -> Dimension;

    fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<ScoreResult>;
}

/// Final, immutable result of one (plan, request, ground truth) evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub nutrition_score: f64,
    pub constraint_score: f64,
    pub inventory_score: f64,
    pub quality_score: f64,
    pub total_score: f64,
    pub violations: Vec<String>,
    #[serde(default)]
    pub allergen_violation: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, f64>,
}

/// A scorer result tagged with where and how much it counts.
struct WeightedResult {
    name: &'static str,
    dimension: Dimension,
    weight: f64,
    result: ScoreResult,
}

/// Fold weighted results into a breakdown, applying the allergen override.
fn combine(parts: Vec<WeightedResult>) -> ScoreBreakdown {
    // (weighted sum, weight, plain sum, count) per dimension
    let mut dimension_sums: BTreeMap<Dimension, (f64, f64, f64, usize)> = BTreeMap::new();
    let mut total = 0.0;
    let mut violations = Vec::new();
    let mut details = BTreeMap::new();
    let mut allergen_violation = false;

    for part in parts {
        let score = part.result.score.clamp(0.0, 1.0);
        total += score * part.weight;

        let entry = dimension_sums
            .entry(part.dimension)
            .or_insert((0.0, 0.0, 0.0, 0));
        entry.0 += score * part.weight;
        entry.1 += part.weight;
        entry.2 += score;
        entry.3 += 1;

        allergen_violation |= part.result.allergen_violation;
        violations.extend(part.result.violations);
        for (key, value) in part.result.details {
            details.insert(format!("{}.{}", part.name, key), value);
        }
    }

    // Several scorers may share a dimension; report their weighted mean.
    let dimension_score = |dimension: Dimension| match dimension_sums.get(&dimension) {
        Some(&(weighted, weight, _, _)) if weight > 0.0 => weighted / weight,
        Some(&(_, _, plain, count)) if count > 0 => plain / count as f64,
        _ => 0.0,
    };

    let mut total_score = total.clamp(0.0, 1.0);
    if allergen_violation {
        warn!("allergen violation detected, total score forced to 0");
        total_score = 0.0;
    }

    ScoreBreakdown {
        nutrition_score: dimension_score(Dimension::Nutrition),
        constraint_score: dimension_score(Dimension::Constraint),
        inventory_score: dimension_score(Dimension::Inventory),
        quality_score: dimension_score(Dimension::Quality),
        total_score,
        violations,
        allergen_violation,
        details,
    }
}

/// Combine four precomputed sub-scores with the given weights.
///
/// The allergen override is applied whenever any input flags an allergen,
/// independent of the constraint score value.
pub fn aggregate(
    weights: &RewardWeights,
    nutrition: ScoreResult,
    constraint: ScoreResult,
    inventory: ScoreResult,
    quality: ScoreResult,
) -> ScoreBreakdown {
    combine(vec![
        WeightedResult {
            name: "nutrition",
            dimension: Dimension::Nutrition,
            weight: weights.nutrition,
            result: nutrition,
        },
        WeightedResult {
            name: "constraint",
            dimension: Dimension::Constraint,
            weight: weights.constraint,
            result: constraint,
        },
        WeightedResult {
            name: "inventory",
            dimension: Dimension::Inventory,
            weight: weights.inventory,
            result: inventory,
        },
        WeightedResult {
            name: "quality",
            dimension: Dimension::Quality,
            weight: weights.quality,
            result: quality,
        },
    ])
}

/// Description of a registered scorer, for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorerInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub dimension: Dimension,
    pub weight: f64,
}

struct WeightedScorer {
    scorer: Box<dyn Scorer>,
    weight: f64,
}

/// Runs every registered scorer and folds the results into a breakdown.
///
/// Stateless between calls; a single instance can be shared across threads.
pub struct RewardAggregator {
    scorers: Vec<WeightedScorer>,
}

impl RewardAggregator {
    /// The standard four-dimension reward function.
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        config.validate()?;
        let w = &config.weights;
        let knowledge = IngredientKnowledge::from_params(&config.constraint);

        let mut aggregator = Self::empty();
        aggregator.register(Box::new(NutritionScorer::new(config.nutrition.clone())), w.nutrition)?;
        aggregator.register(Box::new(ConstraintScorer::new(knowledge.clone())), w.constraint)?;
        aggregator.register(
            Box::new(InventoryScorer::new(knowledge.clone(), config.inventory.clone())),
            w.inventory,
        )?;
        aggregator.register(
            Box::new(QualityScorer::new(config.quality.clone(), knowledge)),
            w.quality,
        )?;
        Ok(aggregator)
    }

    /// An aggregator with no scorers, for custom reward functions.
    pub fn empty() -> Self {
        Self {
            scorers: Vec::new(),
        }
    }

    pub fn register(&mut self, scorer: Box<dyn Scorer>, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(RewardError::validation(format!(
                "weight for scorer '{}' must be non-negative, got {}",
                scorer.name(),
                weight
            )));
        }
        self.scorers.push(WeightedScorer { scorer, weight });
        Ok(())
    }

    /// Remove a scorer by name. Returns true if one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.scorers.len();
        self.scorers.retain(|s| s.scorer.name() != name);
        self.scorers.len() != before
    }

    pub fn scorer_info(&self) -> Vec<ScorerInfo> {
        self.scorers
            .iter()
            .map(|s| ScorerInfo {
                name: s.scorer.name(),
                description: s.scorer.description(),
                dimension: s.scorer.dimension(),
                weight: s.weight,
            })
            .collect()
    }

    /// Score a plan against the request that produced it.
    pub fn evaluate(
        &self,
        plan: &MealPlan,
        request: &MealPlanRequest,
        ground_truth: Option<&BTreeSet<String>>,
    ) -> Result<ScoreBreakdown> {
        request.validate()?;
        if plan.days.is_empty() {
            return Err(RewardError::validation("meal plan has no days"));
        }
        if plan.days.len() != request.days as usize {
            return Err(RewardError::validation(format!(
                "plan covers {} days but the request asked for {}",
                plan.days.len(),
                request.days
            )));
        }
        plan.check_numbers()?;

        let input = EvaluationInput {
            plan,
            request,
            ground_truth,
        };

        let mut parts = Vec::with_capacity(self.scorers.len());
        for entry in &self.scorers {
            let result = entry.scorer.evaluate(&input)?;
            debug!(
                scorer = entry.scorer.name(),
                score = result.score,
                violations = result.violations.len(),
                "scorer finished"
            );
            parts.push(WeightedResult {
                name: entry.scorer.name(),
                dimension: entry.scorer.dimension(),
                weight: entry.weight,
                result,
            });
        }

        Ok(combine(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn test_aggregate_weighted_sum() {
        let weights = RewardWeights::default();
        let breakdown = aggregate(
            &weights,
            ScoreResult::new(0.8),
            ScoreResult::new(1.0),
            ScoreResult::new(0.5),
            ScoreResult::new(0.25),
        );

        let expected = 0.8 * 0.30 + 1.0 * 0.25 + 0.5 * 0.25 + 0.25 * 0.20;
        assert_float_absolute_eq!(breakdown.total_score, expected, 1e-12);
        assert_eq!(breakdown.nutrition_score, 0.8);
        assert_eq!(breakdown.quality_score, 0.25);
        assert!(!breakdown.allergen_violation);
    }

    #[test]
    fn test_aggregate_all_perfect_is_one() {
        let breakdown = aggregate(
            &RewardWeights::default(),
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
        );
        assert_float_absolute_eq!(breakdown.total_score, 1.0, 1e-12);
    }

    #[test]
    fn test_allergen_override_is_independent_of_constraint_score() {
        // Constraint score deliberately left high: the override must still fire.
        let mut constraint = ScoreResult::new(1.0);
        constraint.allergen_violation = true;
        constraint.violations.push("Allergen 'egg' found in mayonnaise".to_string());

        let breakdown = aggregate(
            &RewardWeights::default(),
            ScoreResult::new(1.0),
            constraint,
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
        );

        assert_eq!(breakdown.total_score, 0.0);
        assert!(breakdown.allergen_violation);
        assert_eq!(breakdown.constraint_score, 1.0);
        assert_eq!(breakdown.violations.len(), 1);
    }

    #[test]
    fn test_details_are_prefixed() {
        let breakdown = aggregate(
            &RewardWeights::default(),
            ScoreResult::new(1.0).with_detail("calories_error", 0.05),
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
            ScoreResult::new(1.0),
        );
        assert_eq!(breakdown.details["nutrition.calories_error"], 0.05);
    }

    #[test]
    fn test_register_rejects_negative_weight() {
        let mut aggregator = RewardAggregator::empty();
        let scorer = Box::new(QualityScorer::new(
            Default::default(),
            IngredientKnowledge::builtin(),
        ));
        assert!(aggregator.register(scorer, -0.5).is_err());
    }

    #[test]
    fn test_default_registry() {
        let mut aggregator = RewardAggregator::new(&ScoringConfig::default()).unwrap();
        let info = aggregator.scorer_info();
        let names: Vec<&str> = info.iter().map(|i| i.name).collect();

        assert_eq!(names, vec!["nutrition", "constraint", "inventory", "quality"]);
        let total_weight: f64 = info.iter().map(|i| i.weight).sum();
        assert_float_absolute_eq!(total_weight, 1.0, 1e-12);

        assert!(aggregator.unregister("quality"));
        assert!(!aggregator.unregister("quality"));
        assert_eq!(aggregator.scorer_info().len(), 3);
    }
}
