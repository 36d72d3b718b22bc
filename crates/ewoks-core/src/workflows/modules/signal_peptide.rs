use crate::engine::error::EngineError;
use crate::engine::fractionation::cleave_signal_peptides;
use crate::workflows::dispatch::{ModuleHandler, ModuleOutcome, ModuleRequest, WorkflowContext};
use tracing::info;

/// Cleaves annotated signal peptides using the lookup for the population's proteome.
pub struct SignalPeptideCleavage;

impl ModuleHandler for SignalPeptideCleavage {
    fn id(&self) -> &'static str {
        "signal_peptide"
    }

    fn run(
        &self,
        request: &ModuleRequest<'_>,
        ctx: &mut WorkflowContext,
    ) -> Result<ModuleOutcome, EngineError> {
        let proteome = match request.optional_setting("Proteome")? {
            Some(value) => value.as_str().map(|s| s.trim().to_string()),
            None => ctx.registry.reference_population().map(str::to_string),
        }
        .ok_or_else(|| EngineError::Handler {
            module: self.id().to_string(),
            reason: "no proteome selected and the population has no reference proteome"
                .to_string(),
        })?;

        let lookup = ctx.signal_source.lookup(&proteome)?;
        info!(
            "Using {} signal-peptide annotations for proteome {}.",
            lookup.len(),
            proteome
        );
        let summary = cleave_signal_peptides(&mut ctx.registry, &lookup);
        Ok(ModuleOutcome::new(format!(
            "Cleaved {} signal peptides ({} already cleaved, {} skipped) using {}",
            summary.cleaved, summary.already_cleaved, summary.skipped, proteome
        ))
        .with_resolved("Proteome", proteome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::signal::{SignalPeptideLookup, StaticSignalSource};
    use crate::workflows::modules::test_support::*;
    use crate::workflows::settings::ModuleCatalog;
    use std::path::Path;

    fn source() -> Box<StaticSignalSource> {
        let mut lookup = SignalPeptideLookup::new();
        lookup.insert("P02768", Some("ALBU_HUMAN"), 18);
        Box::new(StaticSignalSource::new().with("UP000005640", lookup))
    }

    const ALBUMIN: (&str, &str) = (
        "sp|P02768|ALBU_HUMAN Albumin AB=40",
        "MKWVTFISLLFLFSSAYSRGVFRRDAHKSEVAHRFKDLGEENFKALVLIAFAQYLQQCPFEDHVKLVNEVTEFAKTCVADESAENCDKS",
    );

    #[test]
    fn uses_reference_population_by_default() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let mut ctx = context_with(Path::new("."), &[ALBUMIN], source());
        ctx.registry.set_reference_population("UP000005640");
        let settings = selected(&[]);

        let outcome = SignalPeptideCleavage
            .run(&request("signal_peptide", &settings, &catalog), &mut ctx)
            .unwrap();

        let albumin = ctx.registry.get("ALBU_HUMAN").unwrap();
        assert_eq!(albumin.sequence().len(), 89 - 18);
        assert!(albumin.sequence().starts_with("RGVFRR"));
        assert_eq!(outcome.resolved["Proteome"], "UP000005640");
    }

    #[test]
    fn explicit_proteome_overrides_reference() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let mut ctx = context_with(Path::new("."), &[ALBUMIN], source());
        ctx.registry.set_reference_population("UP000000589");
        let settings = selected(&[("Proteome", text("UP000005640"))]);

        SignalPeptideCleavage
            .run(&request("signal_peptide", &settings, &catalog), &mut ctx)
            .unwrap();
        assert!(ctx.registry.get("ALBU_HUMAN").unwrap().has_modifications());
    }

    #[test]
    fn missing_proteome_is_a_handler_error() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let mut ctx = context_with(Path::new("."), &[ALBUMIN], source());
        let settings = selected(&[]);
        let result =
            SignalPeptideCleavage.run(&request("signal_peptide", &settings, &catalog), &mut ctx);
        assert!(matches!(result, Err(EngineError::Handler { .. })));
    }

    #[test]
    fn unavailable_lookup_propagates() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let mut ctx = context_with(Path::new("."), &[ALBUMIN], source());
        let settings = selected(&[("Proteome", text("UP000000625"))]);
        let result =
            SignalPeptideCleavage.run(&request("signal_peptide", &settings, &catalog), &mut ctx);
        assert!(matches!(result, Err(EngineError::SignalPeptide { .. })));
    }
}
