use super::header::FastaHeader;
use super::modification::Modification;
use crate::core::properties::{self, DerivedProperties, PropertyError};
use std::ops::RangeInclusive;
use thiserror::Error;

const FASTA_LINE_WIDTH: usize = 60;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Property computation failed for '{entry_name}': {source}")]
    Property {
        entry_name: String,
        #[source]
        source: PropertyError,
    },

    #[error("Invalid abundance {value} for '{entry_name}': must be finite and non-negative")]
    InvalidAbundance { entry_name: String, value: f64 },

    #[error("Invalid region {start}-{end} for '{entry_name}' (sequence length {length})")]
    InvalidRegion {
        entry_name: String,
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Duplicate entry name '{0}' in population")]
    DuplicateEntry(String),
}

/// One protein species in a simulated population.
///
/// The sequence-derived properties are private and recomputed by every operation that
/// changes the sequence, so they can never be read in a stale state. The entry name is
/// the registry key and cannot change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinEntity {
    entry_name: String,
    pub accession: String,
    pub database: String,
    pub protein_name: String,
    pub organism: Option<String>,
    pub organism_id: Option<u32>,
    pub gene_name: Option<String>,
    pub protein_existence: Option<u8>,
    pub sequence_version: Option<u32>,
    sequence: String,
    derived: DerivedProperties,
    abundance: f64,
    modifications: Vec<Modification>,
    imported_as_modified: bool,
    notes: Vec<String>,
}

impl ProteinEntity {
    /// Builds an entity from a bare entry name and sequence, with zero abundance.
    pub fn new(entry_name: &str, sequence: &str) -> Result<Self, ModelError> {
        Self::from_header(
            FastaHeader {
                accession: entry_name.to_string(),
                entry_name: entry_name.to_string(),
                ..Default::default()
            },
            sequence,
        )
    }

    /// Builds an entity from a raw FASTA header line and its sequence.
    pub fn from_record(header: &str, sequence: &str) -> Result<Self, ModelError> {
        Self::from_header(FastaHeader::parse(header), sequence)
    }

    pub fn from_header(header: FastaHeader, sequence: &str) -> Result<Self, ModelError> {
        let sequence: String = sequence
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let derived = compute_for(&header.entry_name, &sequence)?;
        Ok(Self {
            entry_name: header.entry_name,
            accession: header.accession,
            database: header.database,
            protein_name: header.protein_name,
            organism: header.organism,
            organism_id: header.organism_id,
            gene_name: header.gene_name,
            protein_existence: header.protein_existence,
            sequence_version: header.sequence_version,
            sequence,
            derived,
            abundance: header.abundance.unwrap_or(0.0),
            modifications: Vec::new(),
            imported_as_modified: header.modified,
            notes: Vec::new(),
        })
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Molecular weight in kDa.
    pub fn weight(&self) -> f64 {
        self.derived.weight
    }

    pub fn hydrophobicity(&self) -> f64 {
        self.derived.hydrophobicity
    }

    pub fn isoelectric_point(&self) -> f64 {
        self.derived.isoelectric_point
    }

    pub fn derived(&self) -> DerivedProperties {
        self.derived
    }

    pub fn abundance(&self) -> f64 {
        self.abundance
    }

    /// Sets the abundance. There is no upper bound.
    pub fn set_abundance(&mut self, value: f64) -> Result<(), ModelError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ModelError::InvalidAbundance {
                entry_name: self.entry_name.clone(),
                value,
            });
        }
        self.abundance = value;
        Ok(())
    }

    /// Marks the entity as fully depleted. The record itself is kept.
    pub fn zero_abundance(&mut self) {
        self.abundance = 0.0;
    }

    pub fn is_depleted(&self) -> bool {
        self.abundance == 0.0
    }

    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    pub fn has_modifications(&self) -> bool {
        self.imported_as_modified || !self.modifications.is_empty()
    }

    pub fn has_modification(&self, label: &str) -> bool {
        self.modifications.iter().any(|m| m.label == label)
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Reruns the property calculator against the current sequence.
    pub fn recompute_derived(&mut self) -> Result<(), ModelError> {
        self.derived = compute_for(&self.entry_name, &self.sequence)?;
        Ok(())
    }

    /// Returns a copy of this entity with the 1-based inclusive `region` removed and all
    /// derived properties recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRegion`] if the region is empty, falls outside the
    /// sequence, or covers the whole sequence.
    pub fn with_region_cleaved(
        &self,
        region: RangeInclusive<usize>,
        label: &str,
    ) -> Result<Self, ModelError> {
        let (start, end) = (*region.start(), *region.end());
        let length = self.sequence.len();
        if start == 0 || start > end || end > length || (start == 1 && end == length) {
            return Err(ModelError::InvalidRegion {
                entry_name: self.entry_name.clone(),
                start,
                end,
                length,
            });
        }

        let mut cleaved = self.clone();
        cleaved.sequence.replace_range(start - 1..end, "");
        cleaved.recompute_derived()?;
        cleaved
            .modifications
            .push(Modification::new(label, start, end));
        Ok(cleaved)
    }

    /// Removes the 1-based inclusive `region` in place.
    ///
    /// The entity is left untouched when the cleavage fails.
    pub fn cleave_region(
        &mut self,
        region: RangeInclusive<usize>,
        label: &str,
    ) -> Result<(), ModelError> {
        *self = self.with_region_cleaved(region, label)?;
        Ok(())
    }

    pub fn header(&self) -> FastaHeader {
        FastaHeader {
            database: self.database.clone(),
            accession: self.accession.clone(),
            entry_name: self.entry_name.clone(),
            protein_name: self.protein_name.clone(),
            organism: self.organism.clone(),
            organism_id: self.organism_id,
            gene_name: self.gene_name.clone(),
            protein_existence: self.protein_existence,
            sequence_version: self.sequence_version,
            abundance: Some(self.abundance),
            modified: self.has_modifications(),
        }
    }

    /// Serializes the entity as a FASTA record with `AB` and `MD` tags and the sequence
    /// wrapped at 60 residues per line.
    pub fn to_fasta(&self) -> String {
        let mut record = self.header().to_line();
        record.push('\n');
        for chunk in self.sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
            // The sequence is ASCII by construction.
            record.push_str(&String::from_utf8_lossy(chunk));
            record.push('\n');
        }
        record
    }
}

fn compute_for(entry_name: &str, sequence: &str) -> Result<DerivedProperties, ModelError> {
    properties::compute(sequence).map_err(|source| ModelError::Property {
        entry_name: entry_name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = ">sp|P01234|TEST_HUMAN Test protein OS=Homo sapiens OX=9606 GN=TST PE=1 SV=1 AB=12.5";
    const SEQUENCE: &str = "MKWVTFISLLFLFSSAYSRGVFRRDAHKSEVAHRFKDLGEENFKALVLIAFAQYLQQCPFEDHVKLVNEVTEFAKTCVADESAENCDKS";

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn from_record_parses_header_and_computes_properties() {
        let protein = ProteinEntity::from_record(HEADER, SEQUENCE).unwrap();
        assert_eq!(protein.entry_name(), "TEST_HUMAN");
        assert_eq!(protein.accession, "P01234");
        assert_eq!(protein.abundance(), 12.5);
        assert_eq!(protein.weight(), properties::weight(SEQUENCE).unwrap());
        assert!(!protein.has_modifications());
    }

    #[test]
    fn missing_abundance_defaults_to_zero() {
        let protein = ProteinEntity::from_record(">sp|P1|A_HUMAN", "MKV").unwrap();
        assert_eq!(protein.abundance(), 0.0);
        assert!(protein.is_depleted());
    }

    #[test]
    fn sequence_is_normalized_to_uppercase_without_whitespace() {
        let protein = ProteinEntity::new("X", "mk v\nt").unwrap();
        assert_eq!(protein.sequence(), "MKVT");
    }

    #[test]
    fn invalid_residue_fails_construction() {
        let result = ProteinEntity::new("BAD", "MK#V");
        assert!(matches!(
            result,
            Err(ModelError::Property {
                source: PropertyError::InvalidResidue { residue: '#', .. },
                ..
            })
        ));
    }

    #[test]
    fn set_abundance_rejects_negative_and_nan() {
        let mut protein = ProteinEntity::new("X", "MKV").unwrap();
        assert!(protein.set_abundance(1e9).is_ok());
        assert!(protein.set_abundance(-1.0).is_err());
        assert!(protein.set_abundance(f64::NAN).is_err());
        assert_eq!(protein.abundance(), 1e9);
    }

    #[test]
    fn cleave_region_removes_residues_and_recomputes() {
        let mut protein = ProteinEntity::new("X", "MKWVTFISLL").unwrap();
        let before = protein.weight();
        protein.cleave_region(1..=3, "signal peptide").unwrap();
        assert_eq!(protein.sequence(), "VTFISLL");
        assert_eq!(protein.weight(), properties::weight("VTFISLL").unwrap());
        assert!(protein.weight() < before);
        assert_eq!(
            protein.modifications(),
            &[Modification::new("signal peptide", 1, 3)]
        );
        assert!(protein.has_modification("signal peptide"));
    }

    #[test]
    fn with_region_cleaved_leaves_the_original_untouched() {
        let protein = ProteinEntity::new("X", "MKWVTFISLL").unwrap();
        let cleaved = protein.with_region_cleaved(4..=5, "internal").unwrap();
        assert_eq!(protein.sequence(), "MKWVTFISLL");
        assert_eq!(cleaved.sequence(), "MKWFISLL");
    }

    #[test]
    fn invalid_regions_are_rejected_without_mutation() {
        let mut protein = ProteinEntity::new("X", "MKWVT").unwrap();
        for (start, end) in [(0, 2), (3, 2), (2, 6), (1, 5)] {
            let result = protein.cleave_region(start..=end, "bad");
            assert!(matches!(result, Err(ModelError::InvalidRegion { .. })));
        }
        assert_eq!(protein.sequence(), "MKWVT");
        assert!(protein.modifications().is_empty());
    }

    #[test]
    fn to_fasta_wraps_sequence_at_sixty_residues() {
        let protein = ProteinEntity::from_record(HEADER, SEQUENCE).unwrap();
        let fasta = protein.to_fasta();
        let lines: Vec<&str> = fasta.lines().collect();
        assert!(lines[0].starts_with(">sp|P01234|TEST_HUMAN"));
        assert!(lines[0].ends_with("AB=12.5 MD=false"));
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), SEQUENCE.len() - 60);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn fasta_round_trip_preserves_properties_and_tags() {
        let mut protein = ProteinEntity::from_record(HEADER, SEQUENCE).unwrap();
        protein.cleave_region(1..=18, "signal peptide").unwrap();
        protein.set_abundance(3.25).unwrap();

        let fasta = protein.to_fasta();
        let (header, body) = fasta.split_once('\n').unwrap();
        let reparsed = ProteinEntity::from_record(header, body).unwrap();

        assert!(f64_approx_equal(reparsed.weight(), protein.weight()));
        assert!(f64_approx_equal(reparsed.hydrophobicity(), protein.hydrophobicity()));
        assert!(f64_approx_equal(reparsed.isoelectric_point(), protein.isoelectric_point()));
        assert_eq!(reparsed.abundance(), 3.25);
        assert!(reparsed.has_modifications());
        assert_eq!(reparsed.organism.as_deref(), Some("Homo sapiens"));
    }
}
