use crate::core::models::registry::Registry;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AbundanceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed abundance table: {0}")]
    Csv(#[from] csv::Error),
}

/// Which entity field an abundance table identifier refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbundanceKey {
    #[default]
    EntryName,
    GeneName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbundanceSummary {
    pub matched: usize,
    pub unmatched: usize,
}

/// A two-column, tab-separated table of measured abundances (identifier, abundance).
///
/// The first line is a header and is skipped.
#[derive(Debug, Clone, Default)]
pub struct AbundanceTable {
    values: HashMap<String, f64>,
}

impl AbundanceTable {
    pub fn read_from(reader: impl Read) -> Result<Self, AbundanceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut values = HashMap::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != 2 {
                warn!(
                    "Skipping abundance row {}: expected 2 columns, found {}.",
                    row + 2,
                    record.len()
                );
                continue;
            }
            match record[1].parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => {
                    values.insert(record[0].to_string(), value);
                }
                _ => warn!(
                    "Skipping abundance row {}: invalid value '{}'.",
                    row + 2,
                    &record[1]
                ),
            }
        }
        debug!("Read {} abundance value(s).", values.len());
        Ok(Self { values })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, AbundanceError> {
        Self::read_from(File::open(path)?)
    }

    pub fn get(&self, identifier: &str) -> Option<f64> {
        self.values.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Assigns abundances to every entity of the population.
    ///
    /// Entities whose identifier is absent from the table are set to `0.0`.
    pub fn apply(&self, registry: &mut Registry, key: AbundanceKey) -> AbundanceSummary {
        let mut summary = AbundanceSummary::default();
        for protein in registry.iter_mut() {
            let identifier = match key {
                AbundanceKey::EntryName => Some(protein.entry_name()),
                AbundanceKey::GeneName => protein.gene_name.as_deref(),
            };
            let value = identifier.and_then(|id| self.get(id));
            match value.map(|v| protein.set_abundance(v)) {
                Some(Ok(())) => summary.matched += 1,
                Some(Err(e)) => {
                    warn!("Ignoring abundance of '{}': {}", protein.entry_name(), e);
                    protein.zero_abundance();
                    summary.unmatched += 1;
                }
                None => {
                    protein.zero_abundance();
                    summary.unmatched += 1;
                }
            }
        }
        debug!(
            "Applied abundance table: {} matched, {} unmatched.",
            summary.matched, summary.unmatched
        );
        summary
    }
}
