use serde::{Deserialize, Serialize};

use crate::models::request::MacroRatio;

/// Energy density of protein (kcal per gram).
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;

/// Energy density of fat (kcal per gram).
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Energy density of carbohydrate (kcal per gram).
pub const KCAL_PER_G_CARB: f64 = 4.0;

/// Calories and macronutrient grams for a recipe, a day or a whole plan.
///
/// The same shape is used for the per-recipe nutrition summary carried in the
/// plan and for the aggregated totals derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

impl NutritionTotals {
    pub fn new(calories: f64, protein_g: f64, fat_g: f64, carbs_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            fat_g,
            carbs_g,
        }
    }

    /// Target grams for a daily calorie goal split by a macro ratio.
    pub fn from_target(daily_calories: f64, ratio: &MacroRatio) -> Self {
        Self {
            calories: daily_calories,
            protein_g: daily_calories * ratio.protein / 100.0 / KCAL_PER_G_PROTEIN,
            fat_g: daily_calories * ratio.fat / 100.0 / KCAL_PER_G_FAT,
            carbs_g: daily_calories * ratio.carbs / 100.0 / KCAL_PER_G_CARB,
        }
    }

    /// Energy implied by the macro grams (4/9/4 kcal per gram).
    pub fn macro_energy(&self) -> f64 {
        self.protein_g * KCAL_PER_G_PROTEIN
            + self.fat_g * KCAL_PER_G_FAT
            + self.carbs_g * KCAL_PER_G_CARB
    }

    /// True when every field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.calories, self.protein_g, self.fat_g, self.carbs_g]
            .iter()
            .all(|v| v.is_finite())
    }

    /// True when no field is negative.
    pub fn is_non_negative(&self) -> bool {
        [self.calories, self.protein_g, self.fat_g, self.carbs_g]
            .iter()
            .all(|v| *v >= 0.0)
    }

    /// Divide every field by `n`; returns the totals unchanged for `n == 0`.
    pub fn scaled_down(&self, n: usize) -> Self {
        if n == 0 {
            return *self;
        }
        let d = n as f64;
        Self {
            calories: self.calories / d,
            protein_g: self.protein_g / d,
            fat_g: self.fat_g / d,
            carbs_g: self.carbs_g / d,
        }
    }
}

impl std::ops::Add for NutritionTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            fat_g: self.fat_g + other.fat_g,
            carbs_g: self.carbs_g + other.carbs_g,
        }
    }
}

impl std::iter::Sum for NutritionTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn test_from_target_grams() {
        let ratio = MacroRatio::new(30.0, 25.0, 45.0);
        let target = NutritionTotals::from_target(2000.0, &ratio);

        assert_float_absolute_eq!(target.protein_g, 150.0, 1e-9);
        assert_float_absolute_eq!(target.fat_g, 500.0 / 9.0, 1e-9);
        assert_float_absolute_eq!(target.carbs_g, 225.0, 1e-9);
        // Target grams add back up to the calorie goal
        assert_float_absolute_eq!(target.macro_energy(), 2000.0, 1e-9);
    }

    #[test]
    fn test_sum_and_average() {
        let days = vec![
            NutritionTotals::new(1800.0, 100.0, 60.0, 200.0),
            NutritionTotals::new(2200.0, 140.0, 80.0, 240.0),
        ];
        let total: NutritionTotals = days.into_iter().sum();
        let avg = total.scaled_down(2);

        assert_eq!(avg, NutritionTotals::new(2000.0, 120.0, 70.0, 220.0));
    }

    #[test]
    fn test_finite_and_sign_checks() {
        assert!(NutritionTotals::new(1.0, 2.0, 3.0, 4.0).is_finite());
        assert!(!NutritionTotals::new(f64::NAN, 2.0, 3.0, 4.0).is_finite());
        assert!(!NutritionTotals::new(100.0, -1.0, 3.0, 4.0).is_non_negative());
    }
}
