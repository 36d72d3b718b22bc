use super::dispatch::{ModuleDispatcher, ModuleResult, WorkflowContext};
use super::settings::{ModuleCatalog, SelectedSettings};
use crate::engine::error::EngineError;
use crate::engine::gel::Lane;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Deserialize;
use tracing::{info, instrument};

/// One configured step of a workflow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleInstance {
    /// Instance identifier, unique within a workflow.
    pub id: String,
    /// Module identifier the step dispatches to.
    pub module: String,
    #[serde(default)]
    pub settings: SelectedSettings,
}

impl ModuleInstance {
    pub fn new(id: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module: module.into(),
            settings: SelectedSettings::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub step_id: String,
    pub result: ModuleResult,
}

impl StepResult {
    /// The step's population snapshot as a gel lane labelled with the step id.
    pub fn lane(&self) -> Lane {
        Lane::new(self.step_id.clone(), self.result.lane.clone())
    }
}

/// Runs `steps` in order against `ctx`, producing one gel per step.
///
/// # Errors
///
/// Stops at, and returns, the first step error. Steps before it have already mutated
/// the population.
#[instrument(skip_all, name = "workflow", fields(steps = steps.len()))]
pub fn run(
    steps: &[ModuleInstance],
    dispatcher: &ModuleDispatcher,
    catalog: &ModuleCatalog,
    ctx: &mut WorkflowContext,
    reporter: &ProgressReporter,
) -> Result<Vec<StepResult>, EngineError> {
    info!("Running workflow of {} step(s).", steps.len());
    reporter.report(Progress::WorkflowStart {
        total_steps: steps.len() as u64,
    });

    let mut results = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        reporter.report(Progress::StepStart {
            index,
            module: step.module.clone(),
        });
        info!("Step {} ('{}'): {}", index + 1, step.id, step.module);
        let result = dispatcher.dispatch(&step.module, &step.settings, catalog, ctx)?;
        reporter.message(result.outcome.message.clone());
        reporter.report(Progress::StepFinish { index });
        results.push(StepResult {
            step_id: step.id.clone(),
            result,
        });
    }

    reporter.report(Progress::WorkflowFinish);
    Ok(results)
}

/// Lanes of every step result, in step order.
pub fn lanes(results: &[StepResult]) -> Vec<Lane> {
    results.iter().map(StepResult::lane).collect()
}
