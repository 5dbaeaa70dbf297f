//! Ingredient knowledge used by the constraint and inventory scorers.
//!
//! An ingredient name implies a set of categories (`"mayonnaise"` implies
//! `"egg"`, `"cheddar cheese"` implies `"dairy"` and `"milk"`). Allergens and
//! dietary restrictions are checked against those categories, never against
//! raw substrings, so `"eggplant"` does not trip an egg allergy.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::error::{Result, RewardError};
use crate::models::normalize_name;
use crate::scoring::config::ConstraintParams;

const DAIRY: &[&str] = &["dairy", "milk"];
const TREE_NUT: &[&str] = &["nuts", "tree nut"];
const PEANUT: &[&str] = &["nuts", "peanut"];
const GLUTEN_CARB: &[&str] = &["gluten", "wheat", "high-carb"];
const SOY: &[&str] = &["soy"];
const SHELLFISH: &[&str] = &["shellfish", "seafood"];
const FISH: &[&str] = &["fish", "seafood"];
const MEAT: &[&str] = &["meat"];
const POULTRY: &[&str] = &["meat", "poultry"];
const EGG: &[&str] = &["egg"];
const HIGH_CARB: &[&str] = &["high-carb"];
const PLANT: &[&str] = &[];

/// Built-in ingredient keyword → implied categories.
///
/// Multi-word keys take precedence over the single words they contain.
const IMPLICATIONS: &[(&str, &[&str])] = &[
    // dairy
    ("milk", DAIRY),
    ("cheese", DAIRY),
    ("butter", DAIRY),
    ("cream", DAIRY),
    ("yogurt", DAIRY),
    ("yoghurt", DAIRY),
    ("ghee", DAIRY),
    ("whey", DAIRY),
    ("parmesan", DAIRY),
    ("mozzarella", DAIRY),
    ("feta", DAIRY),
    // nuts
    ("almond", TREE_NUT),
    ("walnut", TREE_NUT),
    ("cashew", TREE_NUT),
    ("pecan", TREE_NUT),
    ("hazelnut", TREE_NUT),
    ("pistachio", TREE_NUT),
    ("peanut", PEANUT),
    ("peanut butter", PEANUT),
    // gluten and starch
    ("wheat", GLUTEN_CARB),
    ("bread", GLUTEN_CARB),
    ("pasta", GLUTEN_CARB),
    ("spaghetti", GLUTEN_CARB),
    ("flour", GLUTEN_CARB),
    ("barley", &["gluten", "high-carb"]),
    ("rye", &["gluten", "high-carb"]),
    ("couscous", GLUTEN_CARB),
    ("noodle", GLUTEN_CARB),
    ("rice", HIGH_CARB),
    ("potato", HIGH_CARB),
    ("sweet potato", HIGH_CARB),
    ("rice noodle", HIGH_CARB),
    // soy
    ("soy", SOY),
    ("tofu", SOY),
    ("tempeh", SOY),
    ("miso", SOY),
    ("edamame", SOY),
    ("soy sauce", &["soy", "gluten"]),
    // seafood
    ("shrimp", SHELLFISH),
    ("prawn", SHELLFISH),
    ("crab", SHELLFISH),
    ("lobster", SHELLFISH),
    ("oyster", SHELLFISH),
    ("mussel", SHELLFISH),
    ("clam", SHELLFISH),
    ("fish", FISH),
    ("salmon", FISH),
    ("tuna", FISH),
    ("cod", FISH),
    ("trout", FISH),
    ("anchovy", FISH),
    ("sardine", FISH),
    ("fish sauce", FISH),
    ("worcestershire", FISH),
    // meat
    ("meat", MEAT),
    ("beef", MEAT),
    ("pork", MEAT),
    ("lamb", MEAT),
    ("veal", MEAT),
    ("bacon", MEAT),
    ("ham", MEAT),
    ("sausage", MEAT),
    ("gelatin", MEAT),
    ("chicken", POULTRY),
    ("turkey", POULTRY),
    ("duck", POULTRY),
    // egg and egg-based compounds
    ("egg", EGG),
    ("mayonnaise", EGG),
    ("mayo", EGG),
    ("aioli", EGG),
    ("meringue", EGG),
    ("hollandaise", &["egg", "dairy", "milk"]),
    ("caesar dressing", &["egg", "fish", "seafood", "dairy", "milk"]),
    ("pesto", &["nuts", "tree nut", "dairy", "milk"]),
    ("honey", &["honey"]),
    // plant look-alikes that must not inherit the single-word categories
    ("coconut milk", PLANT),
    ("almond milk", TREE_NUT),
    ("soy milk", SOY),
    ("oat milk", PLANT),
    ("cocoa butter", PLANT),
    ("cream of tartar", PLANT),
];

/// Built-in restriction tag → forbidden categories.
const RESTRICTIONS: &[(&str, &[&str])] = &[
    ("vegetarian", &["meat", "poultry", "fish", "shellfish", "seafood"]),
    (
        "vegan",
        &["meat", "poultry", "fish", "shellfish", "seafood", "dairy", "egg", "honey"],
    ),
    ("pescatarian", &["meat", "poultry"]),
    ("low-carb", &["high-carb"]),
    ("gluten-free", &["gluten"]),
    ("dairy-free", &["dairy"]),
    ("nut-free", &["nuts"]),
];

/// Basics a planner may reasonably leave off the inventory.
const PANTRY_STAPLES: &[&str] = &[
    "salt",
    "sugar",
    "oil",
    "olive oil",
    "vegetable oil",
    "soy sauce",
    "vinegar",
    "pepper",
    "black pepper",
    "water",
    "butter",
    "milk",
    "egg",
    "flour",
];

/// Declared-allergen synonyms → categories they stand for.
const ALLERGEN_ALIASES: &[(&str, &[&str])] = &[
    ("lactose", &["dairy"]),
    ("crustacean", &["shellfish"]),
    ("mollusc", &["shellfish"]),
    ("mollusk", &["shellfish"]),
    ("groundnut", &["peanut"]),
];

/// Words dropped from allergen declarations ("dairy products", "egg allergy").
const ALLERGEN_FILLER: &[&str] = &[
    "allergy",
    "allergies",
    "food",
    "foods",
    "intolerance",
    "product",
    "products",
];

/// Categories that count as protein sources.
pub const PROTEIN_CATEGORIES: &[&str] = &["meat", "poultry", "fish", "shellfish", "egg", "soy"];

static BUILTIN: LazyLock<IngredientKnowledge> = LazyLock::new(|| {
    let mut knowledge = IngredientKnowledge::empty();
    for (ingredient, categories) in IMPLICATIONS {
        knowledge.add_implication(ingredient, categories.iter().copied());
    }
    for (tag, forbidden) in RESTRICTIONS {
        knowledge.add_restriction(tag, forbidden.iter().copied());
    }
    for (alias, categories) in ALLERGEN_ALIASES {
        knowledge.add_allergen_alias(alias, categories.iter().copied());
    }
    knowledge.staples = PANTRY_STAPLES.iter().map(|s| normalize_name(s)).collect();
    knowledge
});

/// Split a name into lowercase alphanumeric words.
pub(crate) fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word equality that tolerates simple plurals.
pub(crate) fn token_eq(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    long.strip_prefix(short)
        .is_some_and(|rest| rest == "s" || rest == "es")
}

/// Same words in the same order, tolerating plurals.
fn words_eq(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| token_eq(x, y))
}

/// Allergen words with filler such as "products" removed.
fn allergen_words(allergen: &str) -> Vec<String> {
    let mut words = tokenize(allergen);
    words.retain(|w| !ALLERGEN_FILLER.contains(&w.as_str()));
    words
}

/// Positions of `needle` words inside `haystack`, skipping taken positions.
fn find_words(haystack: &[String], taken: &[bool], needle: &[String]) -> Option<Vec<usize>> {
    let mut positions: Vec<usize> = Vec::with_capacity(needle.len());
    for word in needle {
        let pos = (0..haystack.len())
            .find(|&i| !taken[i] && !positions.contains(&i) && token_eq(&haystack[i], word))?;
        positions.push(pos);
    }
    Some(positions)
}

/// Normalize a restriction tag so `Low Carb`, `low_carb` and `low-carb` agree.
fn restriction_key(tag: &str) -> String {
    normalize_name(tag).replace([' ', '_'], "-")
}

/// Extensible ingredient → category table plus restriction definitions.
#[derive(Debug, Clone, Default)]
pub struct IngredientKnowledge {
    implications: BTreeMap<String, BTreeSet<String>>,
    restrictions: BTreeMap<String, BTreeSet<String>>,
    allergen_aliases: BTreeMap<String, BTreeSet<String>>,
    staples: BTreeSet<String>,
}

impl IngredientKnowledge {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// The built-in table extended with configured implications and aliases.
    pub fn from_params(params: &ConstraintParams) -> Self {
        let mut knowledge = Self::builtin();
        knowledge.extend_implications(&params.extra_implications);
        for (alias, categories) in &params.allergen_aliases {
            knowledge.add_allergen_alias(alias, categories.iter().map(String::as_str));
        }
        knowledge
    }

    /// Add (or extend) the categories implied by an ingredient keyword.
    pub fn add_implication<'a>(
        &mut self,
        ingredient: &str,
        categories: impl IntoIterator<Item = &'a str>,
    ) {
        let entry = self
            .implications
            .entry(normalize_name(ingredient))
            .or_default();
        entry.extend(categories.into_iter().map(normalize_name));
    }

    /// Merge user-supplied implications, e.g. from a config file.
    pub fn extend_implications(&mut self, extra: &BTreeMap<String, Vec<String>>) {
        for (ingredient, categories) in extra {
            self.add_implication(ingredient, categories.iter().map(String::as_str));
        }
    }

    pub fn add_restriction<'a>(&mut self, tag: &str, forbidden: impl IntoIterator<Item = &'a str>) {
        let entry = self.restrictions.entry(restriction_key(tag)).or_default();
        entry.extend(forbidden.into_iter().map(normalize_name));
    }

    /// Map a declared allergen wording onto one or more categories.
    pub fn add_allergen_alias<'a>(
        &mut self,
        alias: &str,
        categories: impl IntoIterator<Item = &'a str>,
    ) {
        let entry = self
            .allergen_aliases
            .entry(normalize_name(alias))
            .or_default();
        entry.extend(categories.into_iter().map(normalize_name));
    }

    /// Implication keys, longest (by word count) first, then alphabetical.
    fn ordered_keys(&self) -> Vec<(Vec<String>, &BTreeSet<String>)> {
        let mut keys: Vec<(Vec<String>, &BTreeSet<String>)> = self
            .implications
            .iter()
            .map(|(k, v)| (tokenize(k), v))
            .collect();
        keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        keys
    }

    /// Categories implied by the table entries an ingredient name matches.
    ///
    /// A word consumed by a multi-word key is not matched again by a shorter
    /// key, so `"peanut butter"` is not dairy.
    pub fn implied_categories(&self, ingredient: &str) -> BTreeSet<String> {
        let tokens = tokenize(ingredient);
        let mut taken = vec![false; tokens.len()];
        let mut categories = BTreeSet::new();

        for (key_tokens, implied) in self.ordered_keys() {
            if key_tokens.is_empty() {
                continue;
            }
            if let Some(positions) = find_words(&tokens, &taken, &key_tokens) {
                for p in positions {
                    taken[p] = true;
                }
                categories.extend(implied.iter().cloned());
            }
        }
        categories
    }

    /// Every category an ingredient name implies, including the name itself.
    pub fn categories(&self, ingredient: &str) -> BTreeSet<String> {
        let mut categories = self.implied_categories(ingredient);
        categories.insert(normalize_name(ingredient));
        categories
    }

    /// Every category name the table knows about.
    fn vocabulary(&self) -> BTreeSet<&String> {
        self.implications
            .values()
            .chain(self.restrictions.values())
            .chain(self.allergen_aliases.values())
            .flatten()
            .collect()
    }

    /// Categories a declared allergen refers to.
    ///
    /// Plurals and filler words are tolerated (`"eggs"`, `"tree nuts"`,
    /// `"dairy products"`). Empty when the wording names no known category.
    pub fn allergen_categories(&self, allergen: &str) -> BTreeSet<String> {
        let words = allergen_words(allergen);
        let mut found = BTreeSet::new();
        if words.is_empty() {
            return found;
        }
        for (alias, categories) in &self.allergen_aliases {
            if words_eq(&words, &tokenize(alias)) {
                found.extend(categories.iter().cloned());
            }
        }
        for category in self.vocabulary() {
            if words_eq(&words, &tokenize(category)) {
                found.insert(category.clone());
            }
        }
        found
    }

    /// True when an ingredient falls into a category the allergen refers to.
    ///
    /// An allergen that names no known category is matched as whole words of
    /// the ingredient name instead (`"sesame"` in `"sesame oil"`).
    pub fn contains_allergen(&self, ingredient: &str, allergen: &str) -> bool {
        let targets = self.allergen_categories(allergen);
        if !targets.is_empty() {
            let categories = self.categories(ingredient);
            return targets.iter().any(|t| categories.contains(t));
        }

        let needle = allergen_words(allergen);
        let tokens = tokenize(ingredient);
        let taken = vec![false; tokens.len()];
        !needle.is_empty() && find_words(&tokens, &taken, &needle).is_some()
    }

    pub fn is_known_restriction(&self, tag: &str) -> bool {
        self.restrictions.contains_key(&restriction_key(tag))
    }

    /// Fail on the first restriction tag the table does not define.
    pub fn check_restrictions<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> Result<()> {
        for tag in tags {
            if !self.is_known_restriction(tag) {
                return Err(RewardError::validation(format!(
                    "unknown dietary restriction '{}'",
                    tag
                )));
            }
        }
        Ok(())
    }

    /// True when the ingredient is a protein source (meat, fish, egg, soy, ...).
    pub fn is_protein_source(&self, ingredient: &str) -> bool {
        let categories = self.implied_categories(ingredient);
        PROTEIN_CATEGORIES.iter().any(|c| categories.contains(*c))
    }

    /// The first forbidden category the ingredient falls into, if any.
    ///
    /// Unknown restriction tags are a validation error.
    pub fn restriction_violation(&self, ingredient: &str, restriction: &str) -> Result<Option<String>> {
        let forbidden = self
            .restrictions
            .get(&restriction_key(restriction))
            .ok_or_else(|| {
                RewardError::validation(format!("unknown dietary restriction '{}'", restriction))
            })?;
        let categories = self.categories(ingredient);
        Ok(forbidden.iter().find(|c| categories.contains(*c)).cloned())
    }

    /// Pantry basics do not count against a plan's shopping list.
    pub fn is_staple(&self, ingredient: &str) -> bool {
        let key = normalize_name(ingredient);
        self.staples
            .iter()
            .any(|s| s == &key || token_eq(s, &key))
    }
}
