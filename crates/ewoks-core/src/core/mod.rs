//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Property computation** ([`properties`]) - Molecular weight, Kyte-Doolittle
//!   hydrophobicity and isoelectric point from a sequence
//! - **Population model** ([`models`]) - Protein records, FASTA headers, modification logs
//!   and the keyed population registry
//! - **File I/O** ([`io`]) - FASTA populations, abundance tables and UniProt signal-peptide
//!   annotations

pub mod io;
pub mod models;
pub mod properties;
