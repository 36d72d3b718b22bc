//! Sequence-derived biophysical properties.
//!
//! All functions are pure: identical input always yields an identical result. They share
//! one residue alphabet, the twenty canonical amino acids plus selenocysteine (`U`),
//! pyrrolysine (`O`) and the IUPAC ambiguity codes `B`, `Z`, `J` and `X`.

pub mod calculator;
pub mod tables;

pub use calculator::{
    DerivedProperties, PropertyError, compute, hydrophobicity, isoelectric_point, weight,
};
