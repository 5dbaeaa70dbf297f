use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::evaluation::store::{PlanFile, ScenarioStore};
use crate::models::MealPlan;
use crate::scoring::{RewardAggregator, ScoreBreakdown};

/// Model label used when a plan does not name its model.
pub const UNKNOWN_MODEL: &str = "unknown";

/// How one (model, scenario) evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Ok,
    /// Fully scored, but an allergen forced the total to zero.
    ScoredZero,
    /// The scorer could not evaluate the plan at all.
    EvaluationError,
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvaluationStatus::Ok => "ok",
            EvaluationStatus::ScoredZero => "scored-zero",
            EvaluationStatus::EvaluationError => "evaluation-error",
        };
        f.write_str(label)
    }
}

/// Result of scoring one plan file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub source: PathBuf,
    pub scenario_id: String,
    pub model: String,
    pub status: EvaluationStatus,
    pub breakdown: Option<ScoreBreakdown>,
    pub error: Option<String>,
}

impl EvaluationOutcome {
    fn failed(source: PathBuf, scenario_id: &str, model: &str, error: String) -> Self {
        Self {
            source,
            scenario_id: scenario_id.to_string(),
            model: model.to_string(),
            status: EvaluationStatus::EvaluationError,
            breakdown: None,
            error: Some(error),
        }
    }

    /// Total score, or `None` when the plan could not be evaluated.
    pub fn total_score(&self) -> Option<f64> {
        self.breakdown.as_ref().map(|b| b.total_score)
    }
}

fn model_label(plan: &MealPlan) -> &str {
    if plan.model.trim().is_empty() {
        UNKNOWN_MODEL
    } else {
        plan.model.as_str()
    }
}

/// Score one plan against its scenario from the store.
pub fn evaluate_plan(
    aggregator: &RewardAggregator,
    store: &ScenarioStore,
    plan: &MealPlan,
    source: PathBuf,
) -> EvaluationOutcome {
    let model = model_label(plan);
    let scored = store.get(&plan.scenario_id).and_then(|scenario| {
        let truth = store.ground_truth(&scenario.id);
        aggregator.evaluate(plan, &scenario.request, truth.as_ref())
    });

    match scored {
        Ok(breakdown) => {
            let status = if breakdown.allergen_violation {
                EvaluationStatus::ScoredZero
            } else {
                EvaluationStatus::Ok
            };
            EvaluationOutcome {
                source,
                scenario_id: plan.scenario_id.clone(),
                model: model.to_string(),
                status,
                breakdown: Some(breakdown),
                error: None,
            }
        }
        Err(e) => {
            warn!(scenario = %plan.scenario_id, model, error = %e, "evaluation failed");
            EvaluationOutcome::failed(source, &plan.scenario_id, model, e.to_string())
        }
    }
}

fn evaluate_file(aggregator: &RewardAggregator, store: &ScenarioStore, file: &PlanFile) -> EvaluationOutcome {
    match &file.plan {
        Ok(plan) => evaluate_plan(aggregator, store, plan, file.path.clone()),
        Err(e) => {
            warn!(path = %file.path.display(), error = %e, "unreadable plan file");
            EvaluationOutcome::failed(file.path.clone(), "", UNKNOWN_MODEL, e.to_string())
        }
    }
}

/// Score every plan file in parallel.
///
/// Results come back in the order of `plans`. A failing plan produces an
/// `EvaluationError` outcome and never aborts the rest of the batch.
/// `threads` caps the worker count; `None` uses rayon's global pool.
pub fn evaluate_batch(
    aggregator: &RewardAggregator,
    store: &ScenarioStore,
    plans: &[PlanFile],
    threads: Option<usize>,
) -> Result<Vec<EvaluationOutcome>> {
    info!(plans = plans.len(), scenarios = store.len(), "starting batch evaluation");

    let run = || -> Vec<EvaluationOutcome> {
        plans
            .par_iter()
            .map(|file| evaluate_file(aggregator, store, file))
            .collect()
    };

    let outcomes = match threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(run),
        None => run(),
    };

    let failed = outcomes
        .iter()
        .filter(|o| o.status == EvaluationStatus::EvaluationError)
        .count();
    info!(evaluated = outcomes.len(), failed, "batch evaluation finished");
    Ok(outcomes)
}

/// Per-model aggregate over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model: String,
    /// Plans that produced a breakdown (ok or scored-zero).
    pub scored: usize,
    pub mean_total: f64,
    pub min_total: f64,
    pub max_total: f64,
    pub allergen_violations: usize,
    pub failures: usize,
}

impl ModelSummary {
    /// Max minus min total: how consistent the model is across scenarios.
    pub fn spread(&self) -> f64 {
        self.max_total - self.min_total
    }
}

/// Summaries ranked by mean total, best first. Ties break on model name.
pub fn summarize(outcomes: &[EvaluationOutcome]) -> Vec<ModelSummary> {
    let mut by_model: BTreeMap<&str, Vec<&EvaluationOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        by_model.entry(outcome.model.as_str()).or_default().push(outcome);
    }

    let mut summaries: Vec<ModelSummary> = by_model
        .into_iter()
        .map(|(model, runs)| {
            let totals: Vec<f64> = runs.iter().filter_map(|o| o.total_score()).collect();
            let (mean_total, min_total, max_total) = if totals.is_empty() {
                (0.0, 0.0, 0.0)
            } else {
                (
                    totals.iter().sum::<f64>() / totals.len() as f64,
                    totals.iter().copied().fold(f64::INFINITY, f64::min),
                    totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                )
            };

            ModelSummary {
                model: model.to_string(),
                scored: totals.len(),
                mean_total,
                min_total,
                max_total,
                allergen_violations: runs
                    .iter()
                    .filter(|o| o.status == EvaluationStatus::ScoredZero)
                    .count(),
                failures: runs
                    .iter()
                    .filter(|o| o.status == EvaluationStatus::EvaluationError)
                    .count(),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.mean_total
            .partial_cmp(&a.mean_total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.model.cmp(&b.model))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreBreakdown;

    fn outcome(model: &str, status: EvaluationStatus, total: Option<f64>) -> EvaluationOutcome {
        EvaluationOutcome {
            source: PathBuf::from("plan.json"),
            scenario_id: "s".to_string(),
            model: model.to_string(),
            status,
            breakdown: total.map(|t| ScoreBreakdown {
                nutrition_score: t,
                constraint_score: t,
                inventory_score: t,
                quality_score: t,
                total_score: t,
                violations: vec![],
                allergen_violation: status == EvaluationStatus::ScoredZero,
                details: Default::default(),
            }),
            error: None,
        }
    }

    #[test]
    fn test_summarize_ranks_by_mean() {
        let outcomes = vec![
            outcome("small", EvaluationStatus::Ok, Some(0.5)),
            outcome("large", EvaluationStatus::Ok, Some(0.9)),
            outcome("large", EvaluationStatus::Ok, Some(0.7)),
            outcome("small", EvaluationStatus::ScoredZero, Some(0.0)),
            outcome("small", EvaluationStatus::EvaluationError, None),
        ];

        let summaries = summarize(&outcomes);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].model, "large");
        assert!((summaries[0].mean_total - 0.8).abs() < 1e-12);
        assert!((summaries[0].spread() - 0.2).abs() < 1e-12);

        let small = &summaries[1];
        assert_eq!(small.scored, 2);
        assert_eq!(small.allergen_violations, 1);
        assert_eq!(small.failures, 1);
        assert!((small.mean_total - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_all_failed_model_ranks_last() {
        let outcomes = vec![
            outcome("broken", EvaluationStatus::EvaluationError, None),
            outcome("fine", EvaluationStatus::Ok, Some(0.1)),
        ];
        let summaries = summarize(&outcomes);
        assert_eq!(summaries[0].model, "fine");
        assert_eq!(summaries[1].scored, 0);
        assert_eq!(summaries[1].mean_total, 0.0);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(EvaluationStatus::Ok.to_string(), "ok");
        assert_eq!(EvaluationStatus::ScoredZero.to_string(), "scored-zero");
        assert_eq!(EvaluationStatus::EvaluationError.to_string(), "evaluation-error");
    }
}
