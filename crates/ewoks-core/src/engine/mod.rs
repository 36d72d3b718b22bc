//! # Engine Module
//!
//! Stateful simulation logic over an explicit [`Registry`](crate::core::models::registry::Registry).
//!
//! - **Fractionation** ([`fractionation`]) - window filters, depletion and signal-peptide
//!   cleavage, applied as batch mutations of a population
//! - **Gel rendering** ([`gel`]) - rasterizes a population snapshot into SDS-PAGE lanes
//! - **Configuration** ([`config`]) - validated gel geometry and intensity settings
//! - **Progress Monitoring** ([`progress`]) - callbacks for long-running workflows
//! - **Error Handling** ([`error`]) - the error type shared by engine and workflows

pub mod config;
pub mod error;
pub mod fractionation;
pub mod gel;
pub mod progress;
