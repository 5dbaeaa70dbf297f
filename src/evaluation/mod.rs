pub mod batch;
pub mod output;
pub mod store;

pub use batch::{
    evaluate_batch, evaluate_plan, summarize, EvaluationOutcome, EvaluationStatus, ModelSummary,
};
pub use output::{write_csv, write_json};
pub use store::{
    json_files, load_plan, load_plans, load_scenario, validate_scenarios, PlanFile, RejectedFile,
    ScenarioCheck, ScenarioStore,
};
