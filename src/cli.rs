use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// meal_reward: score LLM-generated meal plans for nutrition, constraints, inventory and quality.
#[derive(Parser, Debug)]
#[command(name = "meal_reward")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Scoring config JSON (weights and tolerances). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output, including per-scorer results.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score one meal plan against its scenario.
    Score {
        /// Scenario JSON file (request and optional ground truth).
        #[arg(long)]
        scenario: PathBuf,

        /// Meal plan JSON file.
        #[arg(long)]
        plan: PathBuf,

        /// Print the breakdown as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Score every plan in a directory against a directory of scenarios.
    Batch {
        /// Directory of scenario JSON files.
        #[arg(long)]
        scenarios: PathBuf,

        /// Directory of meal plan JSON files.
        #[arg(long)]
        plans: PathBuf,

        /// Write per-plan results to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write results and the model ranking to this JSON file.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Worker threads (defaults to one per core).
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Check that every scenario file parses and is a valid request.
    Validate {
        /// Directory of scenario JSON files.
        #[arg(long)]
        scenarios: PathBuf,
    },

    /// Show what a plan would need to buy given the scenario inventory.
    ShoppingList {
        /// Scenario JSON file.
        #[arg(long)]
        scenario: PathBuf,

        /// Meal plan JSON file.
        #[arg(long)]
        plan: PathBuf,
    },

    /// List the registered scorers and their weights.
    Scorers,
}
