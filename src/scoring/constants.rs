// ─────────────────────────────────────────────────────────────────────────────
// Reward weights (must sum to 1.0)
// ─────────────────────────────────────────────────────────────────────────────

/// Weight of the nutrition accuracy sub-score.
pub const WEIGHT_NUTRITION: f64 = 0.30;

/// Weight of the constraint compliance sub-score.
pub const WEIGHT_CONSTRAINT: f64 = 0.25;

/// Weight of the inventory utilization sub-score.
pub const WEIGHT_INVENTORY: f64 = 0.25;

/// Weight of the quality sub-score.
pub const WEIGHT_QUALITY: f64 = 0.20;

/// Allowed drift of the weight sum away from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

// ─────────────────────────────────────────────────────────────────────────────
// Nutrition
// ─────────────────────────────────────────────────────────────────────────────

/// Relative error that still earns full credit for a metric.
pub const NUTRITION_TOLERANCE: f64 = 0.10;

/// Relative error at which a metric earns zero credit.
pub const NUTRITION_CEILING: f64 = 0.50;

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

/// Utilization penalty per shopping-list item that is not a pantry staple.
pub const EXTRA_ITEM_PENALTY: f64 = 0.10;

/// Minimum Jaro-Winkler similarity for two ingredient names to match.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.93;

// ─────────────────────────────────────────────────────────────────────────────
// Quality
// ─────────────────────────────────────────────────────────────────────────────

/// A day may deviate this much from the multi-day calorie average.
pub const BALANCE_THRESHOLD: f64 = 0.20;

/// Allowed relative gap between stated calories and 4/9/4 macro energy.
pub const ENERGY_CONSISTENCY_TOLERANCE: f64 = 0.25;

/// Target share of daily calories for breakfast, lunch and dinner.
pub const MEAL_CALORIE_SHARES: [f64; 3] = [0.25, 0.35, 0.40];

/// Summed absolute drift from the meal shares before a day is flagged.
pub const MEAL_DISTRIBUTION_TOLERANCE: f64 = 0.20;

/// Coefficient of variation at which day-to-day consistency reaches zero.
pub const CONSISTENCY_CV_CEILING: f64 = 0.30;
