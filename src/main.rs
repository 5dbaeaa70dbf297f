use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{Level, info};

use meal_reward_rs::cli::{Cli, Command};
use meal_reward_rs::error::{Result, RewardError};
use meal_reward_rs::evaluation::{
    ScenarioStore, evaluate_batch, load_plan, load_plans, load_scenario, summarize,
    validate_scenarios, write_csv, write_json,
};
use meal_reward_rs::interface::{
    display_batch, display_breakdown, display_ranking, display_scorers, display_shopping_list,
    display_validation,
};
use meal_reward_rs::scoring::{
    IngredientKnowledge, RewardAggregator, ScoringConfig, derive_shopping_list,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading scoring config");
            ScoringConfig::load(p)
        }
        None => Ok(ScoringConfig::default()),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Score {
            scenario,
            plan,
            json,
        } => cmd_score(&config, &scenario, &plan, json),
        Command::Batch {
            scenarios,
            plans,
            csv,
            json,
            threads,
        } => cmd_batch(&config, &scenarios, &plans, csv, json, threads),
        Command::Validate { scenarios } => cmd_validate(&config, &scenarios),
        Command::ShoppingList { scenario, plan } => cmd_shopping_list(&config, &scenario, &plan),
        Command::Scorers => cmd_scorers(&config),
    }
}

/// Score one plan against one scenario.
fn cmd_score(config: &ScoringConfig, scenario_path: &Path, plan_path: &Path, json: bool) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;
    let plan = load_plan(plan_path)?;

    if plan.scenario_id != scenario.id {
        return Err(RewardError::validation(format!(
            "plan was generated for scenario '{}' but '{}' was given",
            plan.scenario_id, scenario.id
        )));
    }

    let aggregator = RewardAggregator::new(config)?;
    let truth = scenario.ground_truth.as_ref().map(|g| g.shopping_list());
    let breakdown = aggregator.evaluate(&plan, &scenario.request, truth.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        display_breakdown(&plan, &breakdown);
    }
    Ok(())
}

/// Score a directory of plans in parallel and rank the models.
fn cmd_batch(
    config: &ScoringConfig,
    scenarios_dir: &Path,
    plans_dir: &Path,
    csv_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
    threads: Option<usize>,
) -> Result<()> {
    let (store, rejected) = ScenarioStore::load_dir(scenarios_dir)?;
    if store.is_empty() {
        return Err(RewardError::validation(format!(
            "no usable scenarios in {}",
            scenarios_dir.display()
        )));
    }
    info!(
        scenarios = store.len(),
        rejected = rejected.len(),
        "loaded scenarios"
    );

    let plans = load_plans(plans_dir)?;
    if plans.is_empty() {
        println!("No plan files found in {}", plans_dir.display());
        return Ok(());
    }

    let aggregator = RewardAggregator::new(config)?;
    let outcomes = evaluate_batch(&aggregator, &store, &plans, threads)?;
    let summaries = summarize(&outcomes);

    display_batch(&outcomes);
    display_ranking(&summaries);

    if let Some(path) = csv_path {
        write_csv(&outcomes, &path)?;
        println!("Results written to {}", path.display());
    }
    if let Some(path) = json_path {
        write_json(&outcomes, &summaries, &path)?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

/// Check every scenario file in a directory.
fn cmd_validate(config: &ScoringConfig, scenarios_dir: &Path) -> Result<()> {
    let knowledge = IngredientKnowledge::from_params(&config.constraint);
    let checks = validate_scenarios(scenarios_dir, &knowledge)?;
    if checks.is_empty() {
        println!("No scenario files found in {}", scenarios_dir.display());
        return Ok(());
    }
    display_validation(&checks);

    let invalid = checks.iter().filter(|c| !c.is_valid()).count();
    if invalid > 0 {
        return Err(RewardError::validation(format!(
            "{} scenario file(s) failed validation",
            invalid
        )));
    }
    Ok(())
}

/// Print the shopping list a plan implies.
fn cmd_shopping_list(config: &ScoringConfig, scenario_path: &Path, plan_path: &Path) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;
    let plan = load_plan(plan_path)?;
    scenario.request.validate()?;
    plan.check_numbers()?;

    let knowledge = IngredientKnowledge::from_params(&config.constraint);
    let list = derive_shopping_list(&plan, &scenario.request.inventory, &knowledge, &config.inventory);
    display_shopping_list(&list);
    Ok(())
}

/// List registered scorers.
fn cmd_scorers(config: &ScoringConfig) -> Result<()> {
    let aggregator = RewardAggregator::new(config)?;
    display_scorers(&aggregator.scorer_info());
    Ok(())
}
