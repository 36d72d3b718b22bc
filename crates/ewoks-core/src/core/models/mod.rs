//! # Core Models Module
//!
//! Data structures describing a simulated protein population.
//!
//! - [`protein`] - A single protein species with its sequence, derived properties,
//!   abundance and modification log
//! - [`header`] - UniProt-style FASTA header parsing and rendering
//! - [`modification`] - Structural edits recorded on a protein
//! - [`registry`] - The keyed population of one workflow run
//! - [`ids`] - Stable identifiers for registry slots
//!
//! ## Usage
//!
//! ```ignore
//! use ewoks::core::models::{protein::ProteinEntity, registry::Registry};
//!
//! let mut registry = Registry::new();
//! let albumin = ProteinEntity::from_record(">sp|P02768|ALBU_HUMAN Albumin AB=40", "MKWVTFISLL")?;
//! registry.insert(albumin)?;
//! ```

pub mod header;
pub mod ids;
pub mod modification;
pub mod protein;
pub mod registry;
