use super::choice;
use crate::core::io::fasta::{FastaFile, FastaOptions};
use crate::core::io::traits::PopulationFile;
use crate::core::models::registry::DuplicatePolicy;
use crate::engine::error::EngineError;
use crate::workflows::dispatch::{ModuleHandler, ModuleOutcome, ModuleRequest, WorkflowContext};
use tracing::info;

/// Replaces the population with the records of a FASTA file.
pub struct FastaInput;

impl ModuleHandler for FastaInput {
    fn id(&self) -> &'static str {
        "fasta_input"
    }

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError> {
        let file = request.setting("FASTA file")?;
        let path = ctx.resolve_path(file.as_str().unwrap_or_default());
        let policy: DuplicatePolicy = choice(request, "Duplicate entries")?;
        let proteome = request
            .optional_setting("Reference proteome")?
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()));

        let options = FastaOptions::with_duplicate_policy(policy);
        let mut loaded = FastaFile::read_from_path(&path, &options)?;
        if let Some(id) = proteome {
            loaded.set_reference_population(id);
        }
        ctx.registry = loaded;

        info!(
            "Loaded {} proteins from {}.",
            ctx.registry.len(),
            path.display()
        );
        Ok(ModuleOutcome::new(format!(
            "Loaded {} proteins from {}",
            ctx.registry.len(),
            path.display()
        )))
    }
}
