use super::{choice, optional_decimal};
use crate::engine::error::EngineError;
use crate::engine::fractionation::{Property, Window, WindowMode, fractionate};
use crate::workflows::dispatch::{ModuleHandler, ModuleOutcome, ModuleRequest, WorkflowContext};

/// A module that keeps the population inside or outside a window over one property.
#[derive(Debug, Clone, Copy)]
pub struct WindowFilter {
    id: &'static str,
    property: Property,
    min_setting: &'static str,
    max_setting: &'static str,
}

impl WindowFilter {
    /// Ultrafiltration by molecular weight.
    pub const fn weight_cutoff() -> Self {
        Self {
            id: "weight_cutoff",
            property: Property::Weight,
            min_setting: "Minimum MW (kDa)",
            max_setting: "Maximum MW (kDa)",
        }
    }

    pub const fn isoelectric_focusing() -> Self {
        Self {
            id: "isoelectric_focusing",
            property: Property::IsoelectricPoint,
            min_setting: "Minimum pI",
            max_setting: "Maximum pI",
        }
    }

    pub const fn hydrophobic_interaction() -> Self {
        Self {
            id: "hydrophobic_interaction",
            property: Property::Hydrophobicity,
            min_setting: "Minimum hydrophobicity",
            max_setting: "Maximum hydrophobicity",
        }
    }
}

impl ModuleHandler for WindowFilter {
    fn id(&self) -> &'static str {
        self.id
    }

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError> {
        let mode: WindowMode = choice(request, "Mode")?;
        let window = Window::from_bounds(
            optional_decimal(request, self.min_setting)?,
            optional_decimal(request, self.max_setting)?,
        )?;
        let summary = fractionate(&mut ctx.registry, self.property, mode, window);
        Ok(ModuleOutcome::new(format!(
            "Kept {} {} {}: {} of {} proteins removed",
            match mode {
                WindowMode::Inside => "inside",
                WindowMode::Outside => "outside",
            },
            self.property,
            window,
            summary.zeroed,
            summary.examined
        )))
    }
}
