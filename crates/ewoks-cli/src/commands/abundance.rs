use super::inspect::read_population;
use crate::cli::{AbundanceArgs, AbundanceKeyArg};
use crate::error::{CliError, Result};
use ewoks::core::io::abundance::{AbundanceKey, AbundanceTable};
use ewoks::core::io::fasta::FastaFile;
use ewoks::core::io::traits::PopulationFile;
use ewoks::engine::error::EngineError;
use tracing::{info, warn};

impl From<AbundanceKeyArg> for AbundanceKey {
    fn from(key: AbundanceKeyArg) -> Self {
        match key {
            AbundanceKeyArg::EntryName => AbundanceKey::EntryName,
            AbundanceKeyArg::GeneName => AbundanceKey::GeneName,
        }
    }
}

pub async fn run(args: AbundanceArgs) -> Result<()> {
    let mut registry = read_population(&args.input)?;

    info!("Reading abundance table from {:?}", &args.table);
    let table =
        AbundanceTable::read_from_path(&args.table).map_err(|e| CliError::FileParsing {
            path: args.table.clone(),
            source: e.into(),
        })?;
    if table.is_empty() {
        warn!("Abundance table {:?} has no usable rows.", &args.table);
    }

    let summary = table.apply(&mut registry, args.key.into());
    FastaFile::write_to_path(&registry, &args.output).map_err(EngineError::from)?;

    println!(
        "✓ Applied {} abundance value(s); {} protein(s) without a value were set to 0.",
        summary.matched, summary.unmatched
    );
    println!("  Population written to: {}", args.output.display());
    Ok(())
}
