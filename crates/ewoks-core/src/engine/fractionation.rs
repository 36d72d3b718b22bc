use super::error::EngineError;
use crate::core::io::signal::SignalPeptideLookup;
use crate::core::models::protein::ProteinEntity;
use crate::core::models::registry::Registry;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

/// Modification label recorded by [`cleave_signal_peptides`].
pub const SIGNAL_PEPTIDE_LABEL: &str = "signal peptide";

/// A sequence-derived property that separation steps act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Weight,
    IsoelectricPoint,
    Hydrophobicity,
}

impl Property {
    pub fn value(self, protein: &ProteinEntity) -> f64 {
        match self {
            Self::Weight => protein.weight(),
            Self::IsoelectricPoint => protein.isoelectric_point(),
            Self::Hydrophobicity => protein.hydrophobicity(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Weight => "weight",
            Self::IsoelectricPoint => "isoelectric point",
            Self::Hydrophobicity => "hydrophobicity",
        };
        f.write_str(name)
    }
}

/// Which side of a window survives a fractionation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Keep entities within the window.
    #[default]
    Inside,
    /// Keep entities outside the window.
    Outside,
}

/// An inclusive property range. Missing bounds are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    min: f64,
    max: f64,
}

impl Window {
    /// Builds a window from bounds as given. A window with `min > max` contains nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWindow`] if either bound is NaN.
    pub fn new(min: f64, max: f64) -> Result<Self, EngineError> {
        if min.is_nan() || max.is_nan() {
            return Err(EngineError::InvalidWindow { min, max });
        }
        Ok(Self { min, max })
    }

    /// Builds a window from optional bounds.
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Result<Self, EngineError> {
        Self::new(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        )
    }

    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// The overlap of two windows, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Window) -> Option<Window> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(Window { min, max })
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FractionationSummary {
    pub examined: usize,
    /// Entities whose abundance dropped to zero in this call.
    pub zeroed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepletionSummary {
    pub matched: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleavageSummary {
    pub cleaved: usize,
    pub already_cleaved: usize,
    pub skipped: usize,
}

/// Zeroes the abundance of every entity on the discarded side of `window`.
///
/// Entities are never removed, and repeating a call changes nothing.
pub fn fractionate(
    registry: &mut Registry,
    property: Property,
    mode: WindowMode,
    window: Window,
) -> FractionationSummary {
    let mut summary = FractionationSummary::default();
    for protein in registry.iter_mut() {
        summary.examined += 1;
        let inside = window.contains(property.value(protein));
        let discard = match mode {
            WindowMode::Inside => !inside,
            WindowMode::Outside => inside,
        };
        if discard && !protein.is_depleted() {
            trace!(
                "Discarding '{}' ({} {:.3}).",
                protein.entry_name(),
                property,
                property.value(protein)
            );
            protein.zero_abundance();
            summary.zeroed += 1;
        }
    }
    debug!(
        "Fractionated by {} ({:?} {}): {} of {} entities zeroed.",
        property, mode, window, summary.zeroed, summary.examined
    );
    summary
}

pub fn fractionate_by_weight(
    registry: &mut Registry,
    mode: WindowMode,
    window: Window,
) -> FractionationSummary {
    fractionate(registry, Property::Weight, mode, window)
}

pub fn fractionate_by_isoelectric_point(
    registry: &mut Registry,
    mode: WindowMode,
    window: Window,
) -> FractionationSummary {
    fractionate(registry, Property::IsoelectricPoint, mode, window)
}

pub fn fractionate_by_hydrophobicity(
    registry: &mut Registry,
    mode: WindowMode,
    window: Window,
) -> FractionationSummary {
    fractionate(registry, Property::Hydrophobicity, mode, window)
}

/// Multiplies the abundance of each named entity by `1 - fraction`.
///
/// Every fraction is validated before any entity is touched. Names that are not in the
/// population are counted as missing and otherwise ignored.
///
/// # Errors
///
/// Returns [`EngineError::InvalidFraction`] if a fraction is outside `[0, 1]` or NaN.
pub fn deplete_by_fraction(
    registry: &mut Registry,
    fractions: &HashMap<String, f64>,
) -> Result<DepletionSummary, EngineError> {
    if let Some((name, &fraction)) = fractions
        .iter()
        .find(|(_, f)| !(0.0..=1.0).contains(*f))
    {
        return Err(EngineError::InvalidFraction {
            entry_name: name.clone(),
            fraction,
        });
    }

    let mut summary = DepletionSummary::default();
    for (name, &fraction) in fractions {
        match registry.get_mut(name) {
            Some(protein) => {
                if fraction >= 1.0 {
                    protein.zero_abundance();
                } else {
                    let remaining = protein.abundance() * (1.0 - fraction);
                    protein.set_abundance(remaining)?;
                }
                summary.matched += 1;
            }
            None => {
                trace!("Depletion target '{}' is not in the population.", name);
                summary.missing += 1;
            }
        }
    }
    debug!(
        "Depleted {} entities ({} targets absent).",
        summary.matched, summary.missing
    );
    Ok(summary)
}

/// Removes annotated signal peptides, residues `1..=boundary`, from every entity found in
/// `lookup`.
///
/// Entities that already carry a signal-peptide modification are left alone, as are
/// boundaries that do not fit the sequence.
pub fn cleave_signal_peptides(
    registry: &mut Registry,
    lookup: &SignalPeptideLookup,
) -> CleavageSummary {
    let mut summary = CleavageSummary::default();
    for protein in registry.iter_mut() {
        let Some(boundary) = lookup.boundary(&protein.accession, protein.entry_name()) else {
            continue;
        };
        if protein.has_modification(SIGNAL_PEPTIDE_LABEL) {
            summary.already_cleaved += 1;
            continue;
        }
        match protein.cleave_region(1..=boundary, SIGNAL_PEPTIDE_LABEL) {
            Ok(()) => summary.cleaved += 1,
            Err(e) => {
                warn!("Skipping signal peptide of '{}': {}", protein.entry_name(), e);
                summary.skipped += 1;
            }
        }
    }
    debug!(
        "Signal peptides: {} cleaved, {} already cleaved, {} skipped.",
        summary.cleaved, summary.already_cleaved, summary.skipped
    );
    summary
}

/// Total abundance of the non-depleted entities whose `property` lies in `window`.
pub fn abundance_in_window(registry: &Registry, property: Property, window: Window) -> f64 {
    registry
        .iter()
        .filter(|p| !p.is_depleted() && window.contains(property.value(p)))
        .map(ProteinEntity::abundance)
        .sum()
}

impl Registry {
    pub fn fractionate_by_weight(
        &mut self,
        mode: WindowMode,
        window: Window,
    ) -> FractionationSummary {
        fractionate_by_weight(self, mode, window)
    }

    pub fn fractionate_by_isoelectric_point(
        &mut self,
        mode: WindowMode,
        window: Window,
    ) -> FractionationSummary {
        fractionate_by_isoelectric_point(self, mode, window)
    }

    pub fn fractionate_by_hydrophobicity(
        &mut self,
        mode: WindowMode,
        window: Window,
    ) -> FractionationSummary {
        fractionate_by_hydrophobicity(self, mode, window)
    }

    pub fn deplete_by_fraction(
        &mut self,
        fractions: &HashMap<String, f64>,
    ) -> Result<DepletionSummary, EngineError> {
        deplete_by_fraction(self, fractions)
    }

    pub fn cleave_signal_peptides(&mut self, lookup: &SignalPeptideLookup) -> CleavageSummary {
        cleave_signal_peptides(self, lookup)
    }
}
