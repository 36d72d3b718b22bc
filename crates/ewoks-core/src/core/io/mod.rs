//! Reading and writing protein populations and their auxiliary data.
//!
//! FASTA is the population format; abundance tables and UniProt signal-peptide
//! responses are read-only inputs applied to an existing population.

pub mod abundance;
pub mod fasta;
pub mod signal;
pub mod traits;
