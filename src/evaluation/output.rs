use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::evaluation::batch::{EvaluationOutcome, ModelSummary};

/// Round a float to n decimal places.
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn score_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_default()
}

/// Write one row per evaluated plan.
pub fn write_csv(outcomes: &[EvaluationOutcome], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "model",
        "scenario_id",
        "status",
        "nutrition_score",
        "constraint_score",
        "inventory_score",
        "quality_score",
        "total_score",
        "violations",
        "error",
    ])?;

    for outcome in outcomes {
        let b = outcome.breakdown.as_ref();
        wtr.write_record([
            outcome.model.clone(),
            outcome.scenario_id.clone(),
            outcome.status.to_string(),
            score_cell(b.map(|b| b.nutrition_score)),
            score_cell(b.map(|b| b.constraint_score)),
            score_cell(b.map(|b| b.inventory_score)),
            score_cell(b.map(|b| b.quality_score)),
            score_cell(b.map(|b| b.total_score)),
            b.map(|b| b.violations.len().to_string()).unwrap_or_default(),
            outcome.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the per-plan outcomes and the model ranking as one JSON document.
pub fn write_json(outcomes: &[EvaluationOutcome], summaries: &[ModelSummary], path: &Path) -> Result<()> {
    let json = serde_json::json!({
        "ranking": summaries.iter().enumerate().map(|(i, s)| {
            serde_json::json!({
                "rank": i + 1,
                "model": s.model,
                "scored": s.scored,
                "mean_total": round_to(s.mean_total, 3),
                "spread": round_to(s.spread(), 3),
                "allergen_violations": s.allergen_violations,
                "failures": s.failures,
            })
        }).collect::<Vec<_>>(),
        "results": outcomes.iter().map(|o| {
            serde_json::json!({
                "model": o.model,
                "scenario_id": o.scenario_id,
                "source": o.source.display().to_string(),
                "status": o.status,
                "scores": o.breakdown.as_ref().map(|b| serde_json::json!({
                    "nutrition": round_to(b.nutrition_score, 3),
                    "constraint": round_to(b.constraint_score, 3),
                    "inventory": round_to(b.inventory_score, 3),
                    "quality": round_to(b.quality_score, 3),
                    "total": round_to(b.total_score, 3),
                })),
                "violations": o.breakdown.as_ref().map(|b| b.violations.clone()).unwrap_or_default(),
                "error": o.error,
            })
        }).collect::<Vec<_>>(),
    });

    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(&json)?.as_bytes())?;
    Ok(())
}
