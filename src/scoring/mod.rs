pub mod aggregator;
pub mod config;
pub mod constants;
pub mod constraint;
pub mod inventory;
pub mod knowledge;
pub mod nutrition;
pub mod quality;

pub use aggregator::{
    aggregate, Dimension, EvaluationInput, RewardAggregator, ScoreBreakdown, ScoreResult, Scorer,
    ScorerInfo,
};
pub use config::{
    ConstraintParams, InventoryParams, NutritionTolerance, QualityParams, RewardWeights,
    ScoringConfig,
};
pub use constants::*;
pub use constraint::{score_constraints, ConstraintScore, ConstraintScorer};
pub use inventory::{
    derive_shopping_list, jaccard, match_inventory, score_inventory, InventoryScore,
    InventoryScorer, ShoppingItem, ShoppingList,
};
pub use knowledge::IngredientKnowledge;
pub use nutrition::{
    metric_score, relative_error, score_nutrition, NutritionErrors, NutritionScore,
    NutritionScorer,
};
pub use quality::{
    balance, diversity, feasibility, ingredient_diversity, is_feasible, macro_consistency,
    meal_distribution, protein_diversity, score_quality, QualityScore, QualityScorer,
};
