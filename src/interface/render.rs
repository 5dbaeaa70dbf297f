use crate::evaluation::{EvaluationOutcome, ModelSummary, ScenarioCheck};
use crate::models::MealPlan;
use crate::scoring::{ScoreBreakdown, ScorerInfo, ShoppingList};

/// Display one score breakdown.
pub fn display_breakdown(plan: &MealPlan, breakdown: &ScoreBreakdown) {
    println!();
    println!(
        "=== Score: scenario {} ({}) ===",
        plan.scenario_id,
        if plan.model.is_empty() { "unknown model" } else { plan.model.as_str() }
    );
    println!();

    let rows = [
        ("Nutrition", breakdown.nutrition_score),
        ("Constraint", breakdown.constraint_score),
        ("Inventory", breakdown.inventory_score),
        ("Quality", breakdown.quality_score),
    ];
    for (label, score) in rows {
        println!("  {:<12} {:.3}", label, score);
    }
    println!("  {:<12} {:.3}", "TOTAL", breakdown.total_score);

    if breakdown.allergen_violation {
        println!();
        println!("  [Allergen violation: total forced to 0]");
    }

    if !breakdown.violations.is_empty() {
        println!();
        println!("--- Violations ({}) ---", breakdown.violations.len());
        for v in &breakdown.violations {
            println!("  - {}", v);
        }
    }

    if !breakdown.details.is_empty() {
        println!();
        println!("--- Details ---");
        let width = breakdown.details.keys().map(|k| k.len()).max().unwrap_or(10);
        for (key, value) in &breakdown.details {
            println!("  {:<width$}  {:.4}", key, value, width = width);
        }
    }
    println!();
}

/// Display every outcome of a batch as a table.
pub fn display_batch(outcomes: &[EvaluationOutcome]) {
    if outcomes.is_empty() {
        println!("No plans evaluated.");
        return;
    }

    println!();
    println!("=== Batch Results ({} plans) ===", outcomes.len());
    println!();

    let model_width = outcomes.iter().map(|o| o.model.len()).max().unwrap_or(5).max(5);
    let scenario_width = outcomes
        .iter()
        .map(|o| o.scenario_id.len())
        .max()
        .unwrap_or(8)
        .max(8);

    println!(
        "{:<mw$}  {:<sw$}  {:>5} {:>5} {:>5} {:>5}  {:>5}  status",
        "model",
        "scenario",
        "nutr",
        "cons",
        "inv",
        "qual",
        "total",
        mw = model_width,
        sw = scenario_width
    );

    for o in outcomes {
        match &o.breakdown {
            Some(b) => println!(
                "{:<mw$}  {:<sw$}  {:>5.3} {:>5.3} {:>5.3} {:>5.3}  {:>5.3}  {}",
                o.model,
                o.scenario_id,
                b.nutrition_score,
                b.constraint_score,
                b.inventory_score,
                b.quality_score,
                b.total_score,
                o.status,
                mw = model_width,
                sw = scenario_width
            ),
            None => println!(
                "{:<mw$}  {:<sw$}  {:>35}  {} ({})",
                o.model,
                o.scenario_id,
                "-",
                o.status,
                o.error.as_deref().unwrap_or("unknown error"),
                mw = model_width,
                sw = scenario_width
            ),
        }
    }
    println!();
}

/// Display the model ranking.
pub fn display_ranking(summaries: &[ModelSummary]) {
    if summaries.is_empty() {
        return;
    }

    println!("=== Model Ranking ===");
    println!();
    for (i, s) in summaries.iter().enumerate() {
        println!(
            "#{}: {}  mean={:.3} spread={:.3} scored={} allergen={} failed={}",
            i + 1,
            s.model,
            s.mean_total,
            s.spread(),
            s.scored,
            s.allergen_violations,
            s.failures
        );
    }
    println!();
}

/// Display a derived shopping list.
pub fn display_shopping_list(list: &ShoppingList) {
    if list.is_empty() {
        println!("Shopping list: (none, the inventory covers the plan)");
        return;
    }

    println!();
    println!("=== Shopping List ({} items) ===", list.len());
    println!();

    let width = list.items.keys().map(|k| k.len()).max().unwrap_or(10);
    for item in list.items.values() {
        if item.is_missing() {
            println!("  {:<width$}  {:>7.0} g", item.name, item.needed_g, width = width);
        } else {
            println!(
                "  {:<width$}  {:>7.0} g  (have {:.0} g)",
                item.name,
                item.shortfall_g(),
                item.available_g,
                width = width
            );
        }
    }
    println!();
}

/// Display the registered scorers.
pub fn display_scorers(scorers: &[ScorerInfo]) {
    println!();
    println!("=== Scorers ===");
    println!();
    let width = scorers.iter().map(|s| s.name.len()).max().unwrap_or(10);
    for s in scorers {
        println!(
            "  {:<width$}  weight {:.2}  {}",
            s.name,
            s.weight,
            s.description,
            width = width
        );
    }
    println!();
}

/// Display scenario validation results.
pub fn display_validation(checks: &[ScenarioCheck]) {
    for check in checks {
        let label = check.id.as_deref().unwrap_or("?");
        match &check.error {
            None => println!("  ok      {} ({})", label, check.path.display()),
            Some(e) => println!("  INVALID {} ({}): {}", label, check.path.display(), e),
        }
    }
    let valid = checks.iter().filter(|c| c.is_valid()).count();
    println!();
    println!("{}/{} scenarios valid", valid, checks.len());
}
