use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::error::{Result, RewardError};
use crate::models::{InventoryItem, MealPlan, normalize_name};
use crate::scoring::aggregator::{Dimension, EvaluationInput, ScoreResult, Scorer};
use crate::scoring::config::InventoryParams;
use crate::scoring::knowledge::{IngredientKnowledge, token_eq, tokenize};

/// One line of the derived shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    /// Grams the plan uses in total.
    pub needed_g: f64,
    /// Grams on hand (0 when the ingredient is not in the inventory at all).
    pub available_g: f64,
}

impl ShoppingItem {
    pub fn shortfall_g(&self) -> f64 {
        (self.needed_g - self.available_g).max(0.0)
    }

    pub fn is_missing(&self) -> bool {
        self.available_g <= 0.0
    }
}

/// Ingredients the plan uses but the inventory cannot cover, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: BTreeMap<String, ShoppingItem>,
}

impl ShoppingList {
    pub fn names(&self) -> BTreeSet<String> {
        self.items.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not on hand at all (as opposed to on hand but short).
    pub fn missing(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items.values().filter(|i| i.is_missing())
    }
}

/// `|a ∩ b| / |a ∪ b|`, with two empty sets counting as identical.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Words shared when every word of the inventory name appears in the ingredient name.
///
/// Only a generic inventory name covers a more specific ingredient
/// (`"chicken"` covers `"chicken breast"`), never the reverse.
fn covering_words(inventory: &[String], ingredient: &[String]) -> Option<usize> {
    if inventory.is_empty() {
        return None;
    }
    inventory
        .iter()
        .all(|w| ingredient.iter().any(|i| token_eq(w, i)))
        .then_some(inventory.len())
}

/// Find the inventory key an ingredient name refers to.
///
/// Tries an exact normalized match, then an inventory name whose words all
/// appear in the ingredient, then Jaro-Winkler similarity at or above
/// `threshold` for spelling variants. The last two also require both names
/// to imply the same categories, so `"butter"` never matches `"peanut butter"`.
pub fn match_inventory<'a>(
    ingredient: &str,
    inventory_keys: impl IntoIterator<Item = &'a String>,
    knowledge: &IngredientKnowledge,
    threshold: f64,
) -> Option<&'a String> {
    let key = normalize_name(ingredient);
    let tokens = tokenize(&key);
    let keys: Vec<&String> = inventory_keys.into_iter().collect();

    if let Some(exact) = keys.iter().copied().find(|k| **k == key) {
        return Some(exact);
    }

    let implied = knowledge.implied_categories(&key);
    let compatible = |candidate: &str| knowledge.implied_categories(candidate) == implied;

    let mut best_words: Option<(&String, usize)> = None;
    for &candidate in &keys {
        if let Some(n) = covering_words(&tokenize(candidate), &tokens) {
            if best_words.is_none_or(|(_, best)| n > best) && compatible(candidate.as_str()) {
                best_words = Some((candidate, n));
            }
        }
    }
    if let Some((candidate, _)) = best_words {
        return Some(candidate);
    }

    let mut best_fuzzy: Option<(&String, f64)> = None;
    for &candidate in &keys {
        let similarity = jaro_winkler(&key, candidate);
        if similarity >= threshold
            && best_fuzzy.is_none_or(|(_, best)| similarity > best)
            && compatible(candidate.as_str())
        {
            best_fuzzy = Some((candidate, similarity));
        }
    }
    best_fuzzy.map(|(candidate, _)| candidate)
}

/// Usage of each inventory key, plus the ingredients that matched nothing.
struct Usage {
    used: BTreeMap<String, f64>,
    unmatched: BTreeMap<String, f64>,
}

fn tally_usage(
    plan: &MealPlan,
    available: &BTreeMap<String, f64>,
    knowledge: &IngredientKnowledge,
    threshold: f64,
) -> Usage {
    let mut needed: BTreeMap<String, f64> = BTreeMap::new();
    for meal in plan.meals() {
        for ingredient in &meal.recipe.ingredients {
            let key = ingredient.key();
            if key.is_empty() {
                continue;
            }
            *needed.entry(key).or_insert(0.0) += ingredient.amount_g.max(0.0);
        }
    }

    let mut usage = Usage {
        used: BTreeMap::new(),
        unmatched: BTreeMap::new(),
    };
    for (name, grams) in needed {
        match match_inventory(&name, available.keys(), knowledge, threshold) {
            Some(inventory_key) => {
                *usage.used.entry(inventory_key.clone()).or_insert(0.0) += grams;
            }
            None => {
                usage.unmatched.insert(name, grams);
            }
        }
    }
    usage
}

/// Derive the shopping list: ingredients missing from the inventory, plus
/// inventory items the plan uses more of than is on hand.
pub fn derive_shopping_list(
    plan: &MealPlan,
    inventory: &[InventoryItem],
    knowledge: &IngredientKnowledge,
    params: &InventoryParams,
) -> ShoppingList {
    let available = inventory_amounts(inventory);
    let usage = tally_usage(plan, &available, knowledge, params.fuzzy_match_threshold);
    build_list(&usage, &available)
}

fn inventory_amounts(inventory: &[InventoryItem]) -> BTreeMap<String, f64> {
    let mut amounts = BTreeMap::new();
    for item in inventory {
        let key = item.key();
        if !key.is_empty() {
            *amounts.entry(key).or_insert(0.0) += item.amount_g;
        }
    }
    amounts
}

fn build_list(usage: &Usage, available: &BTreeMap<String, f64>) -> ShoppingList {
    let mut list = ShoppingList::default();
    for (name, grams) in &usage.unmatched {
        list.items.insert(
            name.clone(),
            ShoppingItem {
                name: name.clone(),
                needed_g: *grams,
                available_g: 0.0,
            },
        );
    }
    for (key, grams) in &usage.used {
        let on_hand = available.get(key).copied().unwrap_or(0.0);
        if *grams > on_hand {
            list.items.insert(
                key.clone(),
                ShoppingItem {
                    name: key.clone(),
                    needed_g: *grams,
                    available_g: on_hand,
                },
            );
        }
    }
    list
}

/// Result of the inventory dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryScore {
    pub score: f64,
    pub shopping_list: ShoppingList,
    /// Share of inventory items the plan draws on (utilization mode only).
    pub utilization: Option<f64>,
    /// Shopping-list items that are neither on hand nor pantry staples.
    pub extra_items: usize,
    pub used_ground_truth: bool,
}

/// Score the plan's shopping list.
///
/// With a ground-truth list this is the Jaccard similarity of the two lists.
/// Without one, it is the share of inventory items used minus a penalty per
/// missing non-staple ingredient, clipped to [0, 1]; an empty inventory
/// cannot be scored that way and is a validation error.
pub fn score_inventory(
    plan: &MealPlan,
    inventory: &[InventoryItem],
    ground_truth: Option<&BTreeSet<String>>,
    knowledge: &IngredientKnowledge,
    params: &InventoryParams,
) -> Result<InventoryScore> {
    let available = inventory_amounts(inventory);
    let usage = tally_usage(plan, &available, knowledge, params.fuzzy_match_threshold);
    let shopping_list = build_list(&usage, &available);

    let extra_items = shopping_list
        .missing()
        .filter(|item| !knowledge.is_staple(&item.name))
        .count();

    if let Some(truth) = ground_truth {
        return Ok(InventoryScore {
            score: jaccard(&shopping_list.names(), truth),
            shopping_list,
            utilization: None,
            extra_items,
            used_ground_truth: true,
        });
    }

    if available.is_empty() {
        return Err(RewardError::validation(
            "inventory is empty; utilization cannot be scored without ground truth",
        ));
    }

    let used = usage.used.values().filter(|g| **g > 0.0).count();
    let utilization = used as f64 / available.len() as f64;
    let score = (utilization - params.extra_item_penalty * extra_items as f64).clamp(0.0, 1.0);

    Ok(InventoryScore {
        score,
        shopping_list,
        utilization: Some(utilization),
        extra_items,
        used_ground_truth: false,
    })
}

/// Shopping-list accuracy against ground truth, or inventory utilization.
pub struct InventoryScorer {
    knowledge: IngredientKnowledge,
    params: InventoryParams,
}

impl InventoryScorer {
    pub fn new(knowledge: IngredientKnowledge, params: InventoryParams) -> Self {
        Self { knowledge, params }
    }
}

impl Scorer for InventoryScorer {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn description(&self) -> &'static str {
        "Jaccard similarity of the shopping list to ground truth, else inventory utilization"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Inventory
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> Result<ScoreResult> {
        let result = score_inventory(
            input.plan,
            &input.request.inventory,
            input.ground_truth,
            &self.knowledge,
            &self.params,
        )?;

        let mut out = ScoreResult::new(result.score)
            .with_detail("shopping_items", result.shopping_list.len() as f64)
            .with_detail("extra_items", result.extra_items as f64);
        if let Some(utilization) = result.utilization {
            out = out.with_detail("utilization", utilization);
        }
        Ok(out)
    }
}
