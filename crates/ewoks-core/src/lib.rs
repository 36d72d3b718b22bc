//! # EWOKS Core Library
//!
//! A library for simulating laboratory protein-separation workflows over a population of
//! protein records and rendering the resulting population as a virtual SDS-PAGE gel.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that every scientific step can be
//! tested in isolation:
//!
//! - **[`core`]: The Foundation.** Pure biophysical property computation (`properties`),
//!   the protein record and population registry (`models`), and file readers/writers (`io`).
//!
//! - **[`engine`]: The Logic Core.** Batch fractionation and depletion operations over an
//!   explicit [`Registry`](core::models::registry::Registry), and the gel renderer that turns
//!   a population snapshot into a raster image.
//!
//! - **[`workflows`]: The Public API.** Module schemas and settings extraction, the module
//!   dispatcher with the built-in separation modules, and the pipeline runner that executes
//!   an ordered list of module steps.

pub mod core;
pub mod engine;
pub mod workflows;
