use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use ewoks::core::io::fasta::{FastaFile, FastaOptions};
use ewoks::core::io::traits::PopulationFile;
use ewoks::core::models::protein::ProteinEntity;
use ewoks::core::models::registry::Registry;
use std::path::Path;
use tracing::info;

pub async fn run(args: InspectArgs) -> Result<()> {
    let registry = read_population(&args.input)?;
    info!("Inspecting {} protein(s).", registry.len());

    println!(
        "{:<16} {:<12} {:>10} {:>6} {:>7} {:>10}",
        "Entry", "Accession", "MW (kDa)", "pI", "GRAVY", "Abundance"
    );
    let mut shown = 0;
    for entity in registry
        .iter()
        .filter(|e| !args.present_only || !e.is_depleted())
    {
        println!("{}", format_row(entity));
        shown += 1;
    }
    println!(
        "{} of {} protein(s) shown, total abundance {:.3}",
        shown,
        registry.len(),
        registry.total_abundance()
    );
    Ok(())
}

pub(crate) fn read_population(path: &Path) -> Result<Registry> {
    info!("Loading population from {:?}", path);
    FastaFile::read_from_path(path, &FastaOptions::default()).map_err(|e| {
        CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        }
    })
}

fn format_row(entity: &ProteinEntity) -> String {
    let mut row = format!(
        "{:<16} {:<12} {:>10.3} {:>6.2} {:>7.3} {:>10.3}",
        entity.entry_name(),
        entity.accession,
        entity.weight(),
        entity.isoelectric_point(),
        entity.hydrophobicity(),
        entity.abundance()
    );
    if entity.has_modifications() {
        let edits: Vec<String> = entity
            .modifications()
            .iter()
            .map(|m| format!("{} -{} aa", m.label, m.residue_count()))
            .collect();
        if edits.is_empty() {
            row.push_str("  [modified]");
        } else {
            row.push_str(&format!("  [modified: {}]", edits.join(", ")));
        }
    }
    row
}
