use super::tables::{
    IONIZABLE_SIDE_CHAINS, KYTE_DOOLITTLE, PKA_C_TERMINUS, PKA_N_TERMINUS, RESIDUE_MASSES,
    WATER_MASS_DA,
};
use std::collections::BTreeMap;
use thiserror::Error;

const PH_LOWER_BOUND: f64 = 0.0;
const PH_UPPER_BOUND: f64 = 14.0;
const PH_TOLERANCE: f64 = 1e-4;
const MAX_BISECTION_STEPS: usize = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    #[error("Invalid residue '{residue}' at position {position}")]
    InvalidResidue { residue: char, position: usize },

    #[error("Sequence is empty")]
    EmptySequence,
}

/// The sequence-derived properties of a protein.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedProperties {
    /// Molecular weight in kDa, rounded to three decimals.
    pub weight: f64,
    /// Mean Kyte-Doolittle hydropathy over the whole sequence.
    pub hydrophobicity: f64,
    /// pH at which the net charge is zero.
    pub isoelectric_point: f64,
}

/// Computes weight, hydrophobicity and isoelectric point in one pass over the sequence.
///
/// # Errors
///
/// Returns [`PropertyError::EmptySequence`] for an empty sequence and
/// [`PropertyError::InvalidResidue`] for the first character missing from the residue tables.
pub fn compute(sequence: &str) -> Result<DerivedProperties, PropertyError> {
    Ok(DerivedProperties {
        weight: weight(sequence)?,
        hydrophobicity: hydrophobicity(sequence)?,
        isoelectric_point: isoelectric_point(sequence)?,
    })
}

/// Molecular weight in kDa.
///
/// Sums the free amino-acid masses and subtracts one water per peptide bond.
pub fn weight(sequence: &str) -> Result<f64, PropertyError> {
    let mut total_da = 0.0;
    let mut length = 0usize;
    for (position, residue) in residues(sequence) {
        total_da += RESIDUE_MASSES
            .get(&residue)
            .copied()
            .ok_or(PropertyError::InvalidResidue { residue, position })?;
        length += 1;
    }
    if length == 0 {
        return Err(PropertyError::EmptySequence);
    }
    let total_da = total_da - (length - 1) as f64 * WATER_MASS_DA;
    Ok(round_to_thousandths(total_da / 1000.0))
}

/// Grand average of hydropathy (Kyte-Doolittle) over all residues.
pub fn hydrophobicity(sequence: &str) -> Result<f64, PropertyError> {
    let mut sum = 0.0;
    let mut length = 0usize;
    for (position, residue) in residues(sequence) {
        sum += KYTE_DOOLITTLE
            .get(&residue)
            .copied()
            .ok_or(PropertyError::InvalidResidue { residue, position })?;
        length += 1;
    }
    if length == 0 {
        return Err(PropertyError::EmptySequence);
    }
    Ok(sum / length as f64)
}

/// Isoelectric point by bisection on the Henderson-Hasselbalch net charge.
///
/// The net charge decreases monotonically with pH, so the bracket `[0, 14]` always
/// contains the root (or collapses onto the nearest bound) and the result depends only on
/// the residue composition.
pub fn isoelectric_point(sequence: &str) -> Result<f64, PropertyError> {
    let mut ionizable: BTreeMap<char, usize> = BTreeMap::new();
    let mut length = 0usize;
    for (position, residue) in residues(sequence) {
        if !RESIDUE_MASSES.contains_key(&residue) {
            return Err(PropertyError::InvalidResidue { residue, position });
        }
        if IONIZABLE_SIDE_CHAINS.contains_key(&residue) {
            *ionizable.entry(residue).or_default() += 1;
        }
        length += 1;
    }
    if length == 0 {
        return Err(PropertyError::EmptySequence);
    }

    let mut low = PH_LOWER_BOUND;
    let mut high = PH_UPPER_BOUND;
    for _ in 0..MAX_BISECTION_STEPS {
        if high - low < PH_TOLERANCE {
            break;
        }
        let mid = (low + high) / 2.0;
        if net_charge(&ionizable, mid) > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    Ok((low + high) / 2.0)
}

/// Net charge of a peptide at the given pH.
fn net_charge(ionizable: &BTreeMap<char, usize>, ph: f64) -> f64 {
    let mut charge = positive_fraction(PKA_N_TERMINUS, ph) - negative_fraction(PKA_C_TERMINUS, ph);
    for (residue, &count) in ionizable {
        let (pka, sign) = IONIZABLE_SIDE_CHAINS[residue];
        let contribution = if sign > 0.0 {
            positive_fraction(pka, ph)
        } else {
            -negative_fraction(pka, ph)
        };
        charge += contribution * count as f64;
    }
    charge
}

#[inline]
fn positive_fraction(pka: f64, ph: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(ph - pka))
}

#[inline]
fn negative_fraction(pka: f64, ph: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(pka - ph))
}

#[inline]
fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn residues(sequence: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    sequence
        .chars()
        .enumerate()
        .map(|(i, c)| (i + 1, c.to_ascii_uppercase()))
}
