//! Built-in workflow modules.
//!
//! Each handler reads its settings through [`ModuleRequest`] and mutates the population
//! of the [`WorkflowContext`](super::dispatch::WorkflowContext) it is given.

mod fasta_input;
mod immunodepletion;
mod signal_peptide;
mod size_exclusion;
mod window_filter;

pub use fasta_input::FastaInput;
pub use immunodepletion::Immunodepletion;
pub use signal_peptide::SignalPeptideCleavage;
pub use size_exclusion::SizeExclusion;
pub use window_filter::WindowFilter;

use super::dispatch::{ModuleHandler, ModuleRequest};
use super::settings::{SettingValue, SettingsError};
use crate::engine::error::EngineError;
use serde::de::DeserializeOwned;

pub fn builtin_handlers() -> Vec<Box<dyn ModuleHandler>> {
    vec![
        Box::new(FastaInput),
        Box::new(SizeExclusion),
        Box::new(WindowFilter::weight_cutoff()),
        Box::new(WindowFilter::isoelectric_focusing()),
        Box::new(WindowFilter::hydrophobic_interaction()),
        Box::new(Immunodepletion),
        Box::new(SignalPeptideCleavage),
    ]
}

/// Reads a single-choice setting and deserializes its option value.
fn choice<T: DeserializeOwned>(
    request: &ModuleRequest<'_>,
    setting: &str,
) -> Result<T, EngineError> {
    let value = request.setting(setting)?;
    let raw = match value {
        SettingValue::Choice { value, .. } => value,
        _ => return Err(type_mismatch(setting, "a single choice")),
    };
    raw.try_into::<T>()
        .map_err(|_| type_mismatch(setting, "a recognized option value"))
}

/// Reads an optional decimal setting.
fn optional_decimal(
    request: &ModuleRequest<'_>,
    setting: &str,
) -> Result<Option<f64>, EngineError> {
    match request.optional_setting(setting)? {
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| type_mismatch(setting, "a decimal number")),
        None => Ok(None),
    }
}

fn decimal(request: &ModuleRequest<'_>, setting: &str) -> Result<f64, EngineError> {
    request
        .setting(setting)?
        .as_f64()
        .ok_or_else(|| type_mismatch(setting, "a decimal number"))
}

fn type_mismatch(setting: &str, expected: &'static str) -> EngineError {
    SettingsError::TypeMismatch {
        setting: setting.to_string(),
        expected,
    }
    .into()
}
