use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};
use crate::models::normalize_name;

/// Allowed drift of the macro ratio sum away from 100.
pub const RATIO_SUM_TOLERANCE: f64 = 1.0;

/// An ingredient on hand, with the quantity available in grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub amount_g: f64,
}

impl InventoryItem {
    pub fn new(name: &str, amount_g: f64) -> Self {
        Self {
            name: name.to_string(),
            amount_g,
        }
    }

    /// Canonical key for lookups.
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Target energy split in percent: protein, fat, carbohydrate.
///
/// Serialized as a `[p, f, c]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct MacroRatio {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl MacroRatio {
    pub fn new(protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            protein,
            fat,
            carbs,
        }
    }

    pub fn sum(&self) -> f64 {
        self.protein + self.fat + self.carbs
    }

    pub fn validate(&self) -> Result<()> {
        let parts = [self.protein, self.fat, self.carbs];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(RewardError::validation(format!(
                "macro ratio components must be non-negative numbers, got {:?}",
                parts
            )));
        }
        if (self.sum() - 100.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(RewardError::validation(format!(
                "macro ratio must sum to 100 (±{}), got {:.2}",
                RATIO_SUM_TOLERANCE,
                self.sum()
            )));
        }
        Ok(())
    }
}

impl From<[f64; 3]> for MacroRatio {
    fn from(parts: [f64; 3]) -> Self {
        Self::new(parts[0], parts[1], parts[2])
    }
}

impl From<MacroRatio> for [f64; 3] {
    fn from(ratio: MacroRatio) -> Self {
        [ratio.protein, ratio.fat, ratio.carbs]
    }
}

/// Everything the planner was asked to satisfy for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRequest {
    pub inventory: Vec<InventoryItem>,
    pub daily_calories: f64,
    pub macro_ratio: MacroRatio,
    #[serde(default)]
    pub dietary_restrictions: BTreeSet<String>,
    #[serde(default)]
    pub allergens: BTreeSet<String>,
    pub days: u32,
}

impl MealPlanRequest {
    /// Fail fast on inputs that would make scores incomparable across runs.
    pub fn validate(&self) -> Result<()> {
        if !self.daily_calories.is_finite() || self.daily_calories <= 0.0 {
            return Err(RewardError::validation(format!(
                "daily calorie target must be positive, got {}",
                self.daily_calories
            )));
        }
        self.macro_ratio.validate()?;
        if self.days == 0 {
            return Err(RewardError::validation("plan horizon must be at least one day"));
        }
        for item in &self.inventory {
            if item.key().is_empty() {
                return Err(RewardError::validation("inventory item with an empty name"));
            }
            if !item.amount_g.is_finite() || item.amount_g < 0.0 {
                return Err(RewardError::validation(format!(
                    "inventory amount for '{}' must be a non-negative number, got {}",
                    item.name, item.amount_g
                )));
            }
        }
        Ok(())
    }
}

/// Reference answer for an evaluation scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    #[serde(default)]
    pub expected_missing_ingredients: BTreeSet<String>,
}

impl GroundTruth {
    pub fn shopping_list(&self) -> BTreeSet<String> {
        self.expected_missing_ingredients
            .iter()
            .map(|i| normalize_name(i))
            .collect()
    }
}

/// A named request plus its optional ground truth, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(flatten)]
    pub request: MealPlanRequest,
    #[serde(default)]
    pub ground_truth: Option<GroundTruth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> MealPlanRequest {
        MealPlanRequest {
            inventory: vec![
                InventoryItem::new("Chicken Breast", 500.0),
                InventoryItem::new("rice", 1000.0),
            ],
            daily_calories: 2000.0,
            macro_ratio: MacroRatio::new(30.0, 25.0, 45.0),
            dietary_restrictions: BTreeSet::new(),
            allergens: BTreeSet::new(),
            days: 3,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_calories() {
        let mut request = sample_request();
        request.daily_calories = 0.0;
        assert!(matches!(request.validate(), Err(RewardError::Validation(_))));

        request.daily_calories = -5.0;
        assert!(matches!(request.validate(), Err(RewardError::Validation(_))));
    }

    #[test]
    fn test_rejects_ratio_off_100() {
        let mut request = sample_request();
        request.macro_ratio = MacroRatio::new(30.0, 30.0, 30.0);
        assert!(matches!(request.validate(), Err(RewardError::Validation(_))));

        // Rounding slack is accepted
        request.macro_ratio = MacroRatio::new(33.3, 33.3, 33.3);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_days() {
        let mut request = sample_request();
        request.days = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_scenario_json_shape() {
        let json = r#"{
            "id": "t1",
            "inventory": [{"name": "milk", "amount_g": 1000}],
            "daily_calories": 2000,
            "macro_ratio": [30, 25, 45],
            "allergens": ["Egg"],
            "days": 3,
            "ground_truth": {"expected_missing_ingredients": ["Garlic", "spinach"]}
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.id, "t1");
        assert_eq!(scenario.request.macro_ratio, MacroRatio::new(30.0, 25.0, 45.0));
        assert!(scenario.request.dietary_restrictions.is_empty());
        assert!(scenario.request.allergens.contains("Egg"));

        let truth = scenario.ground_truth.unwrap().shopping_list();
        assert!(truth.contains("garlic"));
        assert!(truth.contains("spinach"));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let json = r#"{"id": "t1", "inventory": [], "macro_ratio": [30, 25, 45], "days": 3}"#;
        assert!(serde_json::from_str::<Scenario>(json).is_err());
    }
}
