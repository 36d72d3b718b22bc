use ewoks::core::io::abundance::{AbundanceKey, AbundanceTable};
use ewoks::core::io::fasta::{FastaFile, FastaOptions};
use ewoks::core::io::signal::DirectorySignalSource;
use ewoks::core::io::traits::PopulationFile;
use ewoks::engine::fractionation::SIGNAL_PEPTIDE_LABEL;
use ewoks::engine::gel::GelRenderer;
use ewoks::engine::progress::ProgressReporter;
use ewoks::workflows::dispatch::{ModuleDispatcher, WorkflowContext};
use ewoks::workflows::pipeline::{self, ModuleInstance};
use ewoks::workflows::settings::ModuleCatalog;
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

const ALBUMIN_FRAGMENT: &str =
    "MKWVTFISLLFLFSSAYSRGVFRRDAHKSEVAHRFKDLGEENFKALVLIAFAQYLQQCPFEDHVKLVNEVTEFAKTCVADESAENCDKS";

const SIGNAL_JSON: &str = r#"{"results": [
    {"primaryAccession": "P02768", "uniProtkbId": "ALBU_HUMAN",
     "features": [{"type": "Signal", "location": {"start": {"value": 1}, "end": {"value": 18}}}]}
]}"#;

const WORKFLOW: &str = r#"
[[steps]]
id = "load"
module = "fasta_input"
[steps.settings]
"FASTA file" = "plasma.fasta"
"Reference proteome" = "UP000005640"

[[steps]]
id = "mature"
module = "signal_peptide"

[[steps]]
id = "deplete"
module = "immunodepletion"
[steps.settings]
"Depletion panel" = ["Albumin"]
"Depletion efficiency" = 0.5

[[steps]]
id = "sec"
module = "size_exclusion"
[steps.settings]
"SEC mode" = "Simulate column"
"SEC column" = "Superdex 75 Increase"
"#;

#[derive(Deserialize)]
struct Workflow {
    steps: Vec<ModuleInstance>,
}

fn plasma_fasta() -> String {
    let albumin = ALBUMIN_FRAGMENT.repeat(6);
    let giant = ALBUMIN_FRAGMENT.repeat(9);
    format!(
        ">sp|P02768|ALBU_HUMAN Albumin OX=9606 GN=ALB AB=40\n{albumin}\n\
         >sp|P01024|CO3_HUMAN Complement C3 OX=9606 GN=C3 AB=1.2\n{giant}\n\
         >sp|P68871|HBB_HUMAN Hemoglobin subunit beta OX=9606 GN=HBB AB=0.5\n{ALBUMIN_FRAGMENT}\n"
    )
}

#[test]
fn plasma_workflow_runs_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("plasma.fasta"), plasma_fasta()).unwrap();
    let signal_dir = dir.path().join("signal");
    fs::create_dir(&signal_dir).unwrap();
    fs::write(signal_dir.join("UP000005640.json"), SIGNAL_JSON).unwrap();

    let workflow: Workflow = toml::from_str(WORKFLOW).unwrap();
    let catalog = ModuleCatalog::builtin().unwrap();
    let renderer = GelRenderer::default().with_marker(true);
    let dispatcher = ModuleDispatcher::with_builtin_modules(renderer);
    dispatcher.validate(&catalog).unwrap();
    let source = DirectorySignalSource::new(&signal_dir);
    let mut ctx = WorkflowContext::new(dir.path(), Box::new(source));

    let results = pipeline::run(
        &workflow.steps,
        &dispatcher,
        &catalog,
        &mut ctx,
        &ProgressReporter::new(),
    )
    .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|step| !step.result.image.is_blank()));

    let albumin = ctx.registry.get("ALBU_HUMAN").unwrap();
    assert!(albumin.has_modification(SIGNAL_PEPTIDE_LABEL));
    assert_eq!(albumin.sequence().len(), 6 * 89 - 18);
    assert_eq!(albumin.abundance(), 20.0);
    assert_eq!(albumin.notes(), ["SEC: Superdex 75 Increase"]);

    assert_eq!(ctx.registry.get("CO3_HUMAN").unwrap().abundance(), 0.0);
    assert_eq!(ctx.registry.get("HBB_HUMAN").unwrap().abundance(), 0.5);
    assert_eq!(ctx.registry.len(), 3);

    let lanes = pipeline::lanes(&results);
    let combined = dispatcher.renderer().render_lanes(&lanes);
    assert_eq!(combined.width, 5 * 96 + 4 * 16);

    let export = dir.path().join("final.fasta");
    FastaFile::write_to_path(&ctx.registry, &export).unwrap();
    let reloaded = FastaFile::read_from_path(&export, &FastaOptions::default()).unwrap();
    assert_eq!(reloaded.get("ALBU_HUMAN").unwrap().abundance(), 20.0);
    assert!(reloaded.get("ALBU_HUMAN").unwrap().has_modifications());
}

#[test]
fn abundance_table_overrides_header_values() {
    let dir = TempDir::new().unwrap();
    let fasta = dir.path().join("plasma.fasta");
    fs::write(&fasta, plasma_fasta()).unwrap();
    let table_path = dir.path().join("abundance.tsv");
    fs::write(&table_path, "gene\tmg_per_ml\nALB\t35\nHBB\t0.1\n").unwrap();

    let mut registry = FastaFile::read_from_path(&fasta, &FastaOptions::default()).unwrap();
    let table = AbundanceTable::read_from_path(&table_path).unwrap();
    let summary = table.apply(&mut registry, AbundanceKey::GeneName);

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(registry.get("ALBU_HUMAN").unwrap().abundance(), 35.0);
    assert_eq!(registry.get("CO3_HUMAN").unwrap().abundance(), 0.0);
}
