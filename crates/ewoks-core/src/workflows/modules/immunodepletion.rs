use super::{decimal, type_mismatch};
use crate::engine::error::EngineError;
use crate::engine::fractionation::deplete_by_fraction;
use crate::workflows::dispatch::{ModuleHandler, ModuleOutcome, ModuleRequest, WorkflowContext};
use crate::workflows::settings::SettingValue;
use std::collections::HashMap;
use tracing::trace;

const PANEL: &str = "Depletion panel";
const EFFICIENCY: &str = "Depletion efficiency";

/// Removes a fixed fraction of every protein targeted by the selected antibody panels.
pub struct Immunodepletion;

impl ModuleHandler for Immunodepletion {
    fn id(&self) -> &'static str {
        "immunodepletion"
    }

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError> {
        let SettingValue::Choices(panels) = request.setting(PANEL)? else {
            return Err(type_mismatch(PANEL, "a list of panels"));
        };
        let efficiency = decimal(request, EFFICIENCY)?;

        let mut fractions = HashMap::new();
        for (label, targets) in &panels {
            let targets = targets
                .as_array()
                .ok_or_else(|| type_mismatch(PANEL, "panels listing entry names"))?;
            for target in targets {
                let name = target
                    .as_str()
                    .ok_or_else(|| type_mismatch(PANEL, "panels listing entry names"))?;
                trace!("Panel '{}' targets '{}'.", label, name);
                fractions.insert(name.to_string(), efficiency);
            }
        }

        let summary = deplete_by_fraction(&mut ctx.registry, &fractions)?;
        let labels: Vec<&str> = panels.iter().map(|(label, _)| label.as_str()).collect();
        Ok(ModuleOutcome::new(format!(
            "Depleted {} of {} targeted proteins at {:.0}% efficiency ({})",
            summary.matched,
            fractions.len(),
            efficiency * 100.0,
            labels.join(", ")
        )))
    }
}
