pub mod cli;
pub mod error;
pub mod evaluation;
pub mod interface;
pub mod models;
pub mod scoring;

pub use error::{Result, RewardError};
pub use models::{MealPlan, MealPlanRequest, NutritionTotals, Scenario};
pub use scoring::{RewardAggregator, ScoreBreakdown, Scorer, ScoringConfig};
