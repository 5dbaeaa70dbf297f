use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};
use crate::scoring::constants::*;

/// Weights applied to the four sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub nutrition: f64,
    pub constraint: f64,
    pub inventory: f64,
    pub quality: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            nutrition: WEIGHT_NUTRITION,
            constraint: WEIGHT_CONSTRAINT,
            inventory: WEIGHT_INVENTORY,
            quality: WEIGHT_QUALITY,
        }
    }
}

impl RewardWeights {
    pub fn sum(&self) -> f64 {
        self.nutrition + self.constraint + self.inventory + self.quality
    }

    pub fn validate(&self) -> Result<()> {
        let parts = [self.nutrition, self.constraint, self.inventory, self.quality];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RewardError::validation(format!(
                "reward weights must be non-negative, got {:?}",
                parts
            )));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RewardError::validation(format!(
                "reward weights must sum to 1.0, got {:.4}",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Tolerance band for nutrition errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionTolerance {
    /// Relative error at or below which a metric scores 1.0.
    pub tolerance: f64,
    /// Relative error at or above which a metric scores 0.0.
    pub ceiling: f64,
}

impl Default for NutritionTolerance {
    fn default() -> Self {
        Self {
            tolerance: NUTRITION_TOLERANCE,
            ceiling: NUTRITION_CEILING,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintParams {
    /// Ingredient → implied categories, merged into the built-in table.
    pub extra_implications: BTreeMap<String, Vec<String>>,
    /// Allergen wording → categories it stands for, e.g. `"ovum": ["egg"]`.
    pub allergen_aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryParams {
    pub extra_item_penalty: f64,
    pub fuzzy_match_threshold: f64,
}

impl Default for InventoryParams {
    fn default() -> Self {
        Self {
            extra_item_penalty: EXTRA_ITEM_PENALTY,
            fuzzy_match_threshold: FUZZY_MATCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    pub balance_threshold: f64,
    pub energy_consistency_tolerance: f64,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            balance_threshold: BALANCE_THRESHOLD,
            energy_consistency_tolerance: ENERGY_CONSISTENCY_TOLERANCE,
        }
    }
}

/// All tunable numbers of the reward function.
///
/// Passed to the aggregator at construction; nothing here is global.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: RewardWeights,
    pub nutrition: NutritionTolerance,
    pub constraint: ConstraintParams,
    pub inventory: InventoryParams,
    pub quality: QualityParams,
}

impl ScoringConfig {
    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ScoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        let n = &self.nutrition;
        if !(0.0..1.0).contains(&n.tolerance) || n.ceiling <= n.tolerance || n.ceiling > 1.0 {
            return Err(RewardError::validation(format!(
                "nutrition tolerance must satisfy 0 <= tolerance < ceiling <= 1, got {} / {}",
                n.tolerance, n.ceiling
            )));
        }

        let inv = &self.inventory;
        if !inv.extra_item_penalty.is_finite() || inv.extra_item_penalty < 0.0 {
            return Err(RewardError::validation(format!(
                "extra item penalty must be non-negative, got {}",
                inv.extra_item_penalty
            )));
        }
        if !(0.0..=1.0).contains(&inv.fuzzy_match_threshold) {
            return Err(RewardError::validation(format!(
                "fuzzy match threshold must be in [0, 1], got {}",
                inv.fuzzy_match_threshold
            )));
        }

        let q = &self.quality;
        if !(q.balance_threshold > 0.0 && q.balance_threshold.is_finite()) {
            return Err(RewardError::validation(format!(
                "balance threshold must be positive, got {}",
                q.balance_threshold
            )));
        }
        if !(q.energy_consistency_tolerance > 0.0 && q.energy_consistency_tolerance.is_finite()) {
            return Err(RewardError::validation(format!(
                "energy consistency tolerance must be positive, got {}",
                q.energy_consistency_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_matches_constants() {
        let config = ScoringConfig::default();
        assert_eq!(config.weights.nutrition, WEIGHT_NUTRITION);
        assert_eq!(config.weights.quality, WEIGHT_QUALITY);
        assert_eq!(config.nutrition.tolerance, NUTRITION_TOLERANCE);
        assert_eq!(config.nutrition.ceiling, NUTRITION_CEILING);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((RewardWeights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_weight_sum() {
        let mut config = ScoringConfig::default();
        config.weights.quality = 0.5;
        assert!(matches!(config.validate(), Err(RewardError::Validation(_))));
    }

    #[test]
    fn test_rejects_inverted_tolerance() {
        let mut config = ScoringConfig::default();
        config.nutrition.tolerance = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let json = r#"{
            "weights": {"nutrition": 0.4, "constraint": 0.2, "inventory": 0.2, "quality": 0.2},
            "constraint": {"extra_implications": {"hollandaise": ["egg", "dairy"]}}
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.weights.nutrition, 0.4);
        // Untouched sections keep defaults
        assert_eq!(config.nutrition, NutritionTolerance::default());
        assert_eq!(
            config.constraint.extra_implications["hollandaise"],
            vec!["egg".to_string(), "dairy".to_string()]
        );
    }

    #[test]
    fn test_load_rejects_invalid_weights() {
        let json = r#"{"weights": {"nutrition": 0.9}}"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert!(ScoringConfig::load(file.path()).is_err());
    }
}
