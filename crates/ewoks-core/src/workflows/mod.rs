//! # Workflows Module
//!
//! The public entry points for simulating separation workflows.
//!
//! A workflow is an ordered list of [`pipeline::ModuleInstance`]s. Each instance names a
//! module whose settings are described by a [`settings::ModuleSchema`] in the
//! [`settings::ModuleCatalog`] and executed by a [`dispatch::ModuleHandler`] registered
//! with the [`dispatch::ModuleDispatcher`]. Every step is followed by one gel render of
//! the resulting population.

pub mod dispatch;
pub mod modules;
pub mod pipeline;
pub mod settings;
