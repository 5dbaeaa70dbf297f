use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, RewardError};
use crate::models::{MealPlan, Scenario};
use crate::scoring::IngredientKnowledge;

/// Load one scenario (request plus optional ground truth) from JSON.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario> {
    let content = fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&content)?;
    Ok(scenario)
}

/// Load one generated meal plan from JSON.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<MealPlan> {
    let content = fs::read_to_string(path)?;
    let plan: MealPlan = serde_json::from_str(&content)?;
    Ok(plan)
}

/// Every `*.json` file directly inside `dir`, sorted by path.
pub fn json_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(RewardError::validation(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// A scenario file that could not be used.
#[derive(Debug)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub error: RewardError,
}

/// Read-only scenario lookup keyed by scenario id.
#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioStore {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        let mut store = Self::default();
        for scenario in scenarios {
            store.insert(scenario);
        }
        store
    }

    /// Add a scenario. A repeated id replaces the earlier entry.
    pub fn insert(&mut self, scenario: Scenario) {
        if let Some(previous) = self.scenarios.insert(scenario.id.clone(), scenario) {
            warn!(scenario = %previous.id, "duplicate scenario id, keeping the last one");
        }
    }

    /// Load every scenario file in a directory.
    ///
    /// Files that fail to parse are returned alongside the store instead of
    /// aborting the load, so plans for the remaining scenarios can still be scored.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<(Self, Vec<RejectedFile>)> {
        let mut store = Self::default();
        let mut rejected = Vec::new();

        for path in json_files(dir)? {
            match load_scenario(&path) {
                Ok(scenario) => {
                    debug!(path = %path.display(), scenario = %scenario.id, "loaded scenario");
                    store.insert(scenario);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable scenario");
                    rejected.push(RejectedFile { path, error });
                }
            }
        }
        Ok((store, rejected))
    }

    pub fn get(&self, id: &str) -> Result<&Scenario> {
        self.scenarios
            .get(id)
            .ok_or_else(|| RewardError::ScenarioNotFound(id.to_string()))
    }

    /// Normalized expected shopping list for a scenario, if it has one.
    pub fn ground_truth(&self, id: &str) -> Option<BTreeSet<String>> {
        self.scenarios
            .get(id)
            .and_then(|s| s.ground_truth.as_ref())
            .map(|truth| truth.shopping_list())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// A plan file, parsed or not.
#[derive(Debug)]
pub struct PlanFile {
    pub path: PathBuf,
    pub plan: Result<MealPlan>,
}

/// Read every plan file in a directory. Parse failures stay attached to their file.
pub fn load_plans<P: AsRef<Path>>(dir: P) -> Result<Vec<PlanFile>> {
    Ok(json_files(dir)?
        .into_iter()
        .map(|path| {
            let plan = load_plan(&path);
            PlanFile { path, plan }
        })
        .collect())
}

/// Outcome of checking one scenario file.
#[derive(Debug)]
pub struct ScenarioCheck {
    pub path: PathBuf,
    pub id: Option<String>,
    pub error: Option<RewardError>,
}

impl ScenarioCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse and validate every scenario file in a directory.
///
/// Restriction tags are checked against `knowledge`, so a scenario that
/// passes here can be scored.
pub fn validate_scenarios<P: AsRef<Path>>(
    dir: P,
    knowledge: &IngredientKnowledge,
) -> Result<Vec<ScenarioCheck>> {
    Ok(json_files(dir)?
        .into_iter()
        .map(|path| match load_scenario(&path) {
            Ok(scenario) => ScenarioCheck {
                path,
                error: scenario
                    .request
                    .validate()
                    .and_then(|_| knowledge.check_restrictions(&scenario.request.dietary_restrictions))
                    .err(),
                id: Some(scenario.id),
            },
            Err(error) => ScenarioCheck {
                path,
                id: None,
                error: Some(error),
            },
        })
        .collect())
}
