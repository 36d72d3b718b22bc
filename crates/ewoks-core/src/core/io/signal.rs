use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum SignalPeptideError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed UniProt response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No signal-peptide data for proteome '{proteome}' (expected at {path})")]
    NotAvailable { proteome: String, path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct UniProtResponse {
    #[serde(default)]
    results: Vec<UniProtEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniProtEntry {
    primary_accession: String,
    #[serde(default, rename = "uniProtkbId")]
    entry_name: Option<String>,
    #[serde(default)]
    features: Vec<UniProtFeature>,
}

#[derive(Debug, Deserialize)]
struct UniProtFeature {
    #[serde(rename = "type")]
    kind: String,
    location: UniProtLocation,
}

#[derive(Debug, Deserialize)]
struct UniProtLocation {
    end: UniProtPosition,
}

#[derive(Debug, Deserialize)]
struct UniProtPosition {
    value: Option<usize>,
}

/// Signal-peptide boundaries (1-based index of the last signal residue) for one proteome.
///
/// Lookups try the accession first and fall back to the entry name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalPeptideLookup {
    by_accession: HashMap<String, usize>,
    by_entry_name: HashMap<String, usize>,
}

impl SignalPeptideLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, accession: &str, entry_name: Option<&str>, boundary: usize) {
        self.by_accession.insert(accession.to_string(), boundary);
        if let Some(name) = entry_name {
            self.by_entry_name.insert(name.to_string(), boundary);
        }
    }

    /// Parses a UniProtKB stream response requested with `fields=accession,id,ft_signal`.
    ///
    /// Entries without a `Signal` feature, or whose end position is unknown, are ignored.
    pub fn from_uniprot_json(reader: impl Read) -> Result<Self, SignalPeptideError> {
        let response: UniProtResponse = serde_json::from_reader(reader)?;
        let mut lookup = Self::new();
        for entry in response.results {
            let boundary = entry
                .features
                .iter()
                .filter(|f| f.kind == "Signal")
                .find_map(|f| f.location.end.value);
            match boundary {
                Some(boundary) if boundary > 0 => {
                    lookup.insert(
                        &entry.primary_accession,
                        entry.entry_name.as_deref(),
                        boundary,
                    );
                }
                _ => trace!("No usable signal feature for {}.", entry.primary_accession),
            }
        }
        debug!("Parsed {} signal-peptide boundaries.", lookup.len());
        Ok(lookup)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SignalPeptideError> {
        Self::from_uniprot_json(BufReader::new(File::open(path)?))
    }

    pub fn boundary(&self, accession: &str, entry_name: &str) -> Option<usize> {
        self.by_accession
            .get(accession)
            .or_else(|| self.by_entry_name.get(entry_name))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_accession.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_accession.is_empty()
    }
}

/// Provides the signal-peptide lookup for a proteome identifier.
pub trait SignalPeptideSource {
    fn lookup(&self, proteome: &str) -> Result<SignalPeptideLookup, SignalPeptideError>;
}

/// Reads `<dir>/<proteome>.json` files as downloaded from the UniProt stream endpoint.
#[derive(Debug, Clone)]
pub struct DirectorySignalSource {
    dir: PathBuf,
}

impl DirectorySignalSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, proteome: &str) -> PathBuf {
        self.dir.join(format!("{proteome}.json"))
    }
}

impl SignalPeptideSource for DirectorySignalSource {
    fn lookup(&self, proteome: &str) -> Result<SignalPeptideLookup, SignalPeptideError> {
        let path = self.path_for(proteome);
        if !path.is_file() {
            return Err(SignalPeptideError::NotAvailable {
                proteome: proteome.to_string(),
                path,
            });
        }
        SignalPeptideLookup::from_path(&path)
    }
}

/// In-memory lookups keyed by proteome identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticSignalSource {
    lookups: HashMap<String, SignalPeptideLookup>,
}

impl StaticSignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, proteome: &str, lookup: SignalPeptideLookup) -> Self {
        self.lookups.insert(proteome.to_string(), lookup);
        self
    }
}

impl SignalPeptideSource for StaticSignalSource {
    fn lookup(&self, proteome: &str) -> Result<SignalPeptideLookup, SignalPeptideError> {
        self.lookups
            .get(proteome)
            .cloned()
            .ok_or_else(|| SignalPeptideError::NotAvailable {
                proteome: proteome.to_string(),
                path: PathBuf::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RESPONSE: &str = r#"{
        "results": [
            {
                "entryType": "UniProtKB reviewed (Swiss-Prot)",
                "primaryAccession": "P02768",
                "uniProtkbId": "ALBU_HUMAN",
                "features": [
                    {
                        "type": "Signal",
                        "location": {
                            "start": {"value": 1, "modifier": "EXACT"},
                            "end": {"value": 18, "modifier": "EXACT"}
                        },
                        "description": ""
                    }
                ]
            },
            {
                "primaryAccession": "P68871",
                "uniProtkbId": "HBB_HUMAN"
            },
            {
                "primaryAccession": "Q99999",
                "uniProtkbId": "UNK_HUMAN",
                "features": [
                    {
                        "type": "Signal",
                        "location": {
                            "start": {"value": 1, "modifier": "EXACT"},
                            "end": {"value": null, "modifier": "UNKNOWN"}
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_signal_features_from_uniprot_response() {
        let lookup = SignalPeptideLookup::from_uniprot_json(RESPONSE.as_bytes()).unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.boundary("P02768", "ignored"), Some(18));
        assert_eq!(lookup.boundary("P68871", "HBB_HUMAN"), None);
        assert_eq!(lookup.boundary("Q99999", "UNK_HUMAN"), None);
    }

    #[test]
    fn falls_back_to_entry_name() {
        let lookup = SignalPeptideLookup::from_uniprot_json(RESPONSE.as_bytes()).unwrap();
        assert_eq!(lookup.boundary("not-an-accession", "ALBU_HUMAN"), Some(18));
    }

    #[test]
    fn rejects_malformed_json() {
        let result = SignalPeptideLookup::from_uniprot_json("{\"results\": [".as_bytes());
        assert!(matches!(result, Err(SignalPeptideError::Json(_))));
    }

    #[test]
    fn directory_source_reads_proteome_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("UP000005640.json"), RESPONSE).unwrap();
        let source = DirectorySignalSource::new(dir.path());

        let lookup = source.lookup("UP000005640").unwrap();
        assert_eq!(lookup.boundary("P02768", ""), Some(18));

        let missing = source.lookup("UP000000589");
        assert!(matches!(missing, Err(SignalPeptideError::NotAvailable { .. })));
    }

    #[test]
    fn static_source_returns_registered_lookup() {
        let mut lookup = SignalPeptideLookup::new();
        lookup.insert("P1", Some("A_HUMAN"), 5);
        let source = StaticSignalSource::new().with("UP1", lookup);
        assert_eq!(source.lookup("UP1").unwrap().boundary("P1", ""), Some(5));
        assert!(source.lookup("UP2").is_err());
    }
}
