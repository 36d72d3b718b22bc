use crate::core::io::traits::PopulationFile;
use crate::core::models::protein::{ModelError, ProteinEntity};
use crate::core::models::registry::{DuplicatePolicy, Registry};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Sequence data on line {line} precedes the first header")]
    OrphanSequence { line: usize },

    #[error("Invalid record starting on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FastaOptions {
    pub duplicate_policy: DuplicatePolicy,
}

impl FastaOptions {
    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self { duplicate_policy }
    }
}

struct PendingRecord {
    line: usize,
    header: String,
    sequence: String,
}

pub struct FastaFile;

impl FastaFile {
    fn flush_record(
        record: Option<PendingRecord>,
        registry: &mut Registry,
        options: &FastaOptions,
    ) -> Result<bool, FastaError> {
        let Some(record) = record else {
            return Ok(false);
        };
        let wrap = |source| FastaError::Record {
            line: record.line,
            source,
        };
        let entity = ProteinEntity::from_record(&record.header, &record.sequence).map_err(wrap)?;
        registry
            .register(entity, options.duplicate_policy)
            .map_err(wrap)?;
        Ok(true)
    }
}

impl PopulationFile for FastaFile {
    type Options = FastaOptions;
    type Error = FastaError;

    fn read_into(
        reader: &mut impl BufRead,
        registry: &mut Registry,
        options: &Self::Options,
    ) -> Result<usize, Self::Error> {
        let mut loaded = 0;
        let mut current: Option<PendingRecord> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('>') {
                if Self::flush_record(current.take(), registry, options)? {
                    loaded += 1;
                }
                current = Some(PendingRecord {
                    line: line_num,
                    header: header.to_string(),
                    sequence: String::new(),
                });
            } else {
                match current.as_mut() {
                    Some(record) => record.sequence.push_str(line),
                    None => return Err(FastaError::OrphanSequence { line: line_num }),
                }
            }
        }
        if Self::flush_record(current.take(), registry, options)? {
            loaded += 1;
        }

        info!("Loaded {} FASTA record(s) into the population.", loaded);
        Ok(loaded)
    }

    fn write_to(registry: &Registry, writer: &mut impl Write) -> Result<(), Self::Error> {
        for protein in registry.iter() {
            writer.write_all(protein.to_fasta().as_bytes())?;
        }
        debug!("Wrote {} FASTA record(s).", registry.len());
        Ok(())
    }
}
