use super::{choice, decimal, type_mismatch};
use crate::core::models::registry::Registry;
use crate::engine::error::EngineError;
use crate::engine::fractionation::{
    Property, Window, WindowMode, abundance_in_window, fractionate_by_weight,
};
use crate::workflows::dispatch::{ModuleHandler, ModuleOutcome, ModuleRequest, WorkflowContext};
use crate::workflows::settings::toml_range;
use serde::Deserialize;
use tracing::debug;

const MODE: &str = "SEC mode";
const COLUMN: &str = "SEC column";
const TARGET_MIN: &str = "Target minimum MW (kDa)";
const TARGET_MAX: &str = "Target maximum MW (kDa)";

const NO_SUITABLE_COLUMN: &str = "SEC: no suitable column found for target window";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SecMode {
    Simulate,
    Recommend,
}

/// The column whose effective window best isolates the target mass range.
#[derive(Debug, Clone, PartialEq)]
struct Recommendation {
    label: String,
    window: Window,
    purity: f64,
}

/// Size-exclusion chromatography: keeps the fraction that elutes within a column's range.
pub struct SizeExclusion;

impl ModuleHandler for SizeExclusion {
    fn id(&self) -> &'static str {
        "size_exclusion"
    }

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError> {
        match choice::<SecMode>(request, MODE)? {
            SecMode::Simulate => {
                let column = request.setting(COLUMN)?;
                let label = column.label().unwrap_or_default().to_string();
                let (low, high) = column
                    .as_range()
                    .ok_or_else(|| type_mismatch(COLUMN, "a [min, max] kDa range"))?;
                let window = apply_column(&mut ctx.registry, low, high, &label)?;
                Ok(ModuleOutcome::new(format!(
                    "Collected the {} kDa fraction of {}",
                    window, label
                )))
            }
            SecMode::Recommend => {
                let target = column_window(
                    decimal(request, TARGET_MIN)?,
                    decimal(request, TARGET_MAX)?,
                )?;
                let mut columns = Vec::new();
                for (label, value) in request.options(COLUMN)? {
                    let (low, high) = toml_range(value)
                        .ok_or_else(|| type_mismatch(COLUMN, "a [min, max] kDa range"))?;
                    columns.push((label.as_str(), column_window(low, high)?));
                }

                match recommend(&ctx.registry, &columns, target) {
                    Some(best) => {
                        let (low, high) = (best.window.min(), best.window.max());
                        apply_column(&mut ctx.registry, low, high, &best.label)?;
                        Ok(ModuleOutcome::new(format!(
                            "Recommended {} for target {} kDa (purity {:.1}%)",
                            best.label,
                            target,
                            best.purity * 100.0
                        ))
                        .with_resolved(COLUMN, best.label))
                    }
                    None => {
                        for protein in ctx.registry.iter_mut() {
                            protein.add_note(NO_SUITABLE_COLUMN);
                        }
                        Ok(ModuleOutcome::new(format!(
                            "No column can isolate the target window {} kDa; population unchanged",
                            target
                        )))
                    }
                }
            }
        }
    }
}

/// A column's separation range in kDa. Reversed bounds are swapped and both are clamped at zero.
fn column_window(low: f64, high: f64) -> Result<Window, EngineError> {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    Window::new(low.max(0.0), high.max(0.0))
}

/// Keeps the `[low, high]` kDa fraction and notes the column on every entity.
fn apply_column(
    registry: &mut Registry,
    low: f64,
    high: f64,
    label: &str,
) -> Result<Window, EngineError> {
    let window = column_window(low, high)?;
    fractionate_by_weight(registry, WindowMode::Inside, window);
    for protein in registry.iter_mut() {
        protein.add_note(format!("SEC: {label}"));
    }
    Ok(window)
}

/// Scores every column by the purity of its effective window: abundance inside the
/// target overlap divided by abundance over the whole column range.
///
/// Columns that do not overlap the target, or that would collect nothing, are skipped.
/// Ties keep the first column in `columns`.
fn recommend(
    registry: &Registry,
    columns: &[(&str, Window)],
    target: Window,
) -> Option<Recommendation> {
    let mut best: Option<Recommendation> = None;
    for &(label, column) in columns {
        let Some(effective) = column.intersect(&target) else {
            continue;
        };
        let in_column = abundance_in_window(registry, Property::Weight, column);
        if in_column <= 0.0 {
            continue;
        }
        let purity = abundance_in_window(registry, Property::Weight, effective) / in_column;
        debug!("Column {} scores purity {:.4} over {}.", label, purity, effective);
        if best.as_ref().is_none_or(|b| purity > b.purity) {
            best = Some(Recommendation {
                label: label.to_string(),
                window: effective,
                purity,
            });
        }
    }
    best
}
